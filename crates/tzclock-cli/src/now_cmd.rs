use std::process::ExitCode;

use tzclock_core::{ChronoTzOracle, TransitionFinder, time_report};

use crate::cli::NowArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{emit, parse_reference};

pub fn run_now(args: NowArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let at = parse_reference(args.at.as_deref())?;
    let report = time_report(&ChronoTzOracle, &TransitionFinder::default(), &args.tz, at)?;

    emit(&report, output_format, |r| {
        let dst = if r.is_dst { "DST" } else { "standard time" };
        let next = r.next_dst_change.as_deref().unwrap_or("none within horizon");
        format!(
            "{} {} ({}, UTC{}, {})\nNext DST change: {}",
            r.zone, r.formatted, r.day_of_week, r.utc_offset, dst, next
        )
    })?;

    Ok(ExitCode::from(EXIT_SUCCESS))
}
