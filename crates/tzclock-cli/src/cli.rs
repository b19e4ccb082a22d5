use clap::{Parser, Subcommand};

/// DST-aware world clock
#[derive(Parser, Debug)]
#[command(name = "tzclock")]
#[command(about = "DST-aware world clock: current time, DST changes, zone conversion")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Show the current time and DST status of a zone
    Now(NowArgs),
    /// Find the next DST change of a zone
    NextChange(NextChangeArgs),
    /// Convert a local time from one zone to another
    Convert(ConvertArgs),
    /// List all known zones
    Zones(ZonesArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "TZCLOCK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "TZCLOCK_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Cache TTL of /time and /convert responses, in seconds
    #[arg(long, env = "TZCLOCK_TIME_TTL_SECS", default_value_t = 10)]
    pub time_ttl_secs: u32,

    /// Cache TTL of the zone list, in seconds
    #[arg(long, env = "TZCLOCK_ZONES_TTL_SECS", default_value_t = 60)]
    pub zones_ttl_secs: u32,

    /// Rate limit window length, in seconds
    #[arg(long, env = "TZCLOCK_WINDOW_SECS", default_value_t = 60)]
    pub window_secs: u32,

    /// Requests allowed per client per window
    #[arg(long, env = "TZCLOCK_MAX_REQUESTS", default_value_t = 120)]
    pub max_requests: u32,

    /// Identify clients by the first X-Forwarded-For hop (only behind a trusted proxy)
    #[arg(long, env = "TZCLOCK_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,
}

#[derive(clap::Args, Debug)]
pub struct NowArgs {
    /// IANA timezone (e.g., Europe/London)
    #[arg(short, long, default_value = "UTC")]
    pub tz: String,

    /// Report this instant instead of now (RFC3339, epoch_s or epoch_ms)
    #[arg(long)]
    pub at: Option<String>,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct NextChangeArgs {
    /// IANA timezone
    #[arg(short, long)]
    pub tz: String,

    /// Search from this instant instead of now (RFC3339, epoch_s or epoch_ms)
    #[arg(long)]
    pub from: Option<String>,

    /// How far ahead to search, in days (at most 36600)
    #[arg(long, default_value_t = 370, value_parser = clap::value_parser!(u32).range(0..=36_600))]
    pub horizon_days: u32,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Source IANA timezone
    #[arg(long)]
    pub from: String,

    /// Target IANA timezone
    #[arg(long)]
    pub to: String,

    /// Local time in the source zone (e.g., 2025-10-19T14:00:00), or RFC3339 with offset
    #[arg(long)]
    pub time: String,

    /// Policy for nonexistent times: error, shift_forward
    #[arg(long, default_value = "shift_forward")]
    pub policy_nonexistent: String,

    /// Policy for ambiguous times: error, first, second
    #[arg(long, default_value = "first")]
    pub policy_ambiguous: String,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct ZonesArgs {
    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}
