use std::process::ExitCode;

use chrono::Duration;
use serde::Serialize;
use tzclock_core::tz::{format_rfc3339_utc, format_utc_offset};
use tzclock_core::{ChronoTzOracle, TransitionFinder, ZoneOracle};

use crate::cli::NextChangeArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{emit, parse_reference};

#[derive(Debug, Serialize)]
struct NextChange {
    zone: String,
    from: String,
    is_dst: bool,
    next_dst_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    utc_offset_after: Option<String>,
}

pub fn run_next_change(args: NextChangeArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let oracle = ChronoTzOracle;
    oracle.ensure_known(&args.tz)?;

    let from = parse_reference(args.from.as_deref())?;
    let state = oracle.offset_and_dst(&args.tz, from)?;
    let horizon = Duration::days(i64::from(args.horizon_days));
    let next = TransitionFinder::default().find_next_within(&oracle, &args.tz, from, horizon)?;

    let utc_offset_after = match next {
        Some(instant) => Some(format_utc_offset(
            oracle.offset_and_dst(&args.tz, instant)?.utc_offset_minutes,
        )),
        None => None,
    };

    let result = NextChange {
        zone: args.tz,
        from: format_rfc3339_utc(&from),
        is_dst: state.is_dst,
        next_dst_change: next.map(|t| format_rfc3339_utc(&t)),
        utc_offset_after,
    };

    emit(&result, output_format, |r| match (&r.next_dst_change, &r.utc_offset_after) {
        (Some(at), Some(offset)) => {
            format!("{}: next DST change at {} (UTC{} after)", r.zone, at, offset)
        }
        _ => format!("{}: no DST change within {} days", r.zone, args.horizon_days),
    })?;

    Ok(ExitCode::from(EXIT_SUCCESS))
}
