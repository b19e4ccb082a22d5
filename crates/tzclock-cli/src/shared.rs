use chrono::{DateTime, Utc};
use tzclock_core::{AmbiguousPolicy, NonexistentPolicy, Policy, parse_instant};

use crate::error::{CliError, CliResult, OutputFormat};

/// The instant given on the command line, or now.
pub fn parse_reference(at: Option<&str>) -> CliResult<DateTime<Utc>> {
    match at {
        Some(s) => parse_instant(s).map_err(|e| CliError::input(e.to_string())),
        None => Ok(Utc::now()),
    }
}

pub fn parse_policy(nonexistent: &str, ambiguous: &str) -> CliResult<Policy> {
    let nonexistent = nonexistent
        .parse::<NonexistentPolicy>()
        .map_err(|_| {
            CliError::input(format!(
                "Invalid policy_nonexistent '{}'. Expected: error, shift_forward",
                nonexistent
            ))
        })?;
    let ambiguous = ambiguous.parse::<AmbiguousPolicy>().map_err(|_| {
        CliError::input(format!(
            "Invalid policy_ambiguous '{}'. Expected: error, first, second",
            ambiguous
        ))
    })?;

    Ok(Policy {
        nonexistent,
        ambiguous,
    })
}

/// Print `value` as pretty JSON or, for text output, via `text`.
pub fn emit<T: serde::Serialize>(
    value: &T,
    output_format: OutputFormat,
    text: impl FnOnce(&T) -> String,
) -> CliResult<()> {
    match output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", text(value)),
    }
    Ok(())
}
