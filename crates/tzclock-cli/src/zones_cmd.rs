use std::process::ExitCode;

use tzclock_core::{ChronoTzOracle, ZoneOracle};

use crate::cli::ZonesArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::emit;

pub fn run_zones(_args: ZonesArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let zones = ChronoTzOracle.list_known_zones();
    emit(&zones, output_format, |zones| zones.join("\n"))?;
    Ok(ExitCode::from(EXIT_SUCCESS))
}
