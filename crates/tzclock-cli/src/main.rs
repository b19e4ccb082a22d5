use std::process::ExitCode;

use clap::Parser;

mod cli;
mod convert_cmd;
mod error;
mod next_change_cmd;
mod now_cmd;
mod server;
mod shared;
mod zones_cmd;

use cli::{Cli, Commands};
use convert_cmd::run_convert;
use error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat, render_error};
use next_change_cmd::run_next_change;
use now_cmd::run_now;
use zones_cmd::run_zones;

fn init_tracing(verbose: bool, default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Parse the output format, then run `command` and render any error in it.
fn dispatch<A>(
    args: A,
    requested_format: &str,
    command: fn(A, OutputFormat) -> CliResult<ExitCode>,
) -> ExitCode {
    let output_format = match requested_format.parse::<OutputFormat>() {
        Ok(format) => format,
        Err(err) => return render_error(&err, OutputFormat::hint(requested_format)),
    };

    match command(args, output_format) {
        Ok(code) => code,
        Err(err) => render_error(&err, output_format),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    init_tracing(cli.verbose, default_level);

    match cli.command {
        Commands::Serve(args) => {
            if let Err(e) = args.to_config().validate() {
                return render_error(&e.into(), OutputFormat::Text);
            }

            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    let err = CliError::runtime(format!("Failed to start runtime: {}", e));
                    return render_error(&err, OutputFormat::Text);
                }
            };

            match runtime.block_on(server::serve(args)) {
                Ok(()) => ExitCode::from(EXIT_SUCCESS),
                Err(e) => render_error(&CliError::runtime(format!("{e:#}")), OutputFormat::Text),
            }
        }
        Commands::Now(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_now)
        }
        Commands::NextChange(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_next_change)
        }
        Commands::Convert(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_convert)
        }
        Commands::Zones(args) => {
            let format = args.output_format.clone();
            dispatch(args, &format, run_zones)
        }
    }
}
