//! Error types for csslint operations.

use thiserror::Error;

/// Raised when a tree cannot be printed. No partial output is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("declaration `{prop}` is not enclosed by a rule or at-rule")]
    OrphanDeclaration { prop: String },

    #[error("root node appears below another node")]
    NestedRoot,

    #[error("{kind} node cannot have children")]
    LeafWithChildren { kind: &'static str },
}

/// Errors surfaced by the lint pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("lint failed: {0}")]
    Lint(String),

    #[error("CSS parse failed: {0}")]
    Parse(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code, logged alongside failed requests.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Lint(_) => "LINT_ERROR",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Format(_) => "FORMAT_ERROR",
            Error::Config(_) | Error::Json(_) => "CONFIG_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(Error::from(FormatError::NestedRoot).code(), "FORMAT_ERROR");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(io).code(), "IO_ERROR");
    }

    #[test]
    fn test_format_error_message() {
        let err = FormatError::OrphanDeclaration {
            prop: "color".into(),
        };
        assert_eq!(
            err.to_string(),
            "declaration `color` is not enclosed by a rule or at-rule"
        );
    }
}
