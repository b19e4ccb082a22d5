use std::fmt;
use std::process::ExitCode;
use std::str::FromStr;

use serde::Serialize;
use tzclock_core::TzClockError;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    /// Best guess at the requested format, used to render the error for an
    /// unrecognised `--output-format` value.
    pub fn hint(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(CliError::input(format!(
                "Invalid output_format '{other}'. Expected: json, text"
            ))),
        }
    }
}

/// A failed command: what to print and which exit code to leave with.
#[derive(Debug)]
pub struct CliError {
    exit_code: u8,
    kind: &'static str,
    message: String,
}

impl CliError {
    /// Bad arguments from the user.
    pub fn input(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_INPUT_ERROR,
            kind: "invalid_argument",
            message: message.into(),
        }
    }

    /// Failure outside the user's control.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_RUNTIME_ERROR,
            kind: "runtime",
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<TzClockError> for CliError {
    fn from(err: TzClockError) -> Self {
        let exit_code = if err.is_client_error() {
            EXIT_INPUT_ERROR
        } else {
            EXIT_RUNTIME_ERROR
        };

        Self {
            exit_code,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

pub type CliResult<T> = std::result::Result<T, CliError>;

/// Same shape as the HTTP error body, plus the exit code.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
    kind: &'a str,
    exit_code: u8,
}

/// Print `err` on stderr and turn it into the process exit code.
pub fn render_error(err: &CliError, output_format: OutputFormat) -> ExitCode {
    let envelope = ErrorEnvelope {
        error: &err.message,
        kind: err.kind,
        exit_code: err.exit_code,
    };

    match output_format {
        OutputFormat::Json => match serde_json::to_string_pretty(&envelope) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error: {err}"),
        },
        OutputFormat::Text => eprintln!("Error: {err}"),
    }

    ExitCode::from(err.exit_code)
}
