use std::process::ExitCode;

use tzclock_core::{ChronoTzOracle, convert};

use crate::cli::ConvertArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{emit, parse_policy};

pub fn run_convert(args: ConvertArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let policy = parse_policy(&args.policy_nonexistent, &args.policy_ambiguous)?;
    let report = convert(&ChronoTzOracle, &args.from, &args.to, &args.time, policy)?;

    emit(&report, output_format, |r| {
        format!(
            "{} ({}) -> {} ({}{})",
            r.input_formatted,
            r.from,
            r.converted_formatted,
            r.to,
            if r.is_dst_in_target { ", DST" } else { "" }
        )
    })?;

    Ok(ExitCode::from(EXIT_SUCCESS))
}
