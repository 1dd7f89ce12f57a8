use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_error_pretty("pass error", &format!("{}", _0)))]
    Pass(#[from] PassError),

    #[error("{}", format_error_pretty("codegen error", &format!("{}", _0)))]
    Codegen(#[from] CodegenError),
}

/// Formats an error with its category prefix.
fn format_error_pretty(category: &str, msg: &str) -> String {
    format!("[{}] {}", category, msg)
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

/// Hard failures that abort a pass pipeline.
///
/// The wrapper pass itself never returns these: its per-site faults are
/// reported as `WrapperDiagnostic`s and processing continues.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("in function '{func}': value '{value}' is used before it is defined")]
    UseBeforeDef { func: String, value: String },

    #[error("in function '{func}': value '{value}' is defined more than once")]
    MultipleDefinition { func: String, value: String },

    #[error("in function '{func}': block '{block}' does not end with exactly one terminator")]
    MissingTerminator { func: String, block: String },

    #[error("in function '{func}': call to '{callee}', which is neither defined nor declared in the module")]
    UnknownCallee { func: String, callee: String },

    #[error("no pass is registered under the name '{name}'")]
    UnknownPass { name: String },
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to format IR text: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    /// Returns a stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Pass(p) => match p {
                PassError::UseBeforeDef { .. } => "E0200",
                PassError::MultipleDefinition { .. } => "E0201",
                PassError::MissingTerminator { .. } => "E0203",
                PassError::UnknownCallee { .. } => "E0206",
                PassError::UnknownPass { .. } => "E0207",
            },
            Error::Codegen(_) => "E0300",
        }
    }
}
