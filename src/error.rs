use thiserror::Error;

/// Error types for descriptor construction and per-line parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The format identifier names no known dialect
    #[error("Unknown log format '{format}', expected one of: {}", crate::models::Dialect::identifiers().join(", "))]
    UnknownFormat {
        format: String,
    },
    /// The line matched structurally but its timestamp did not resolve
    #[error("Failed to parse timestamp '{input}' with layout '{layout}': {message}")]
    TimeParse {
        input: String,
        layout: String,
        message: String,
    },
    /// A dialect pattern failed to compile
    #[error("Regex error for pattern '{pattern}': {message}")]
    Regex {
        pattern: String,
        message: String,
    },
    /// An option or descriptor table is inconsistent
    #[error("Configuration error for '{parameter}': {message}")]
    Configuration {
        parameter: String,
        message: String,
    },
    /// I/O error while loading options
    #[error("I/O error during {operation}: {message}")]
    Io {
        operation: String,
        message: String,
    },
}

impl ParseError {
    /// Short stable name of the variant, used for statistics buckets
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::UnknownFormat { .. } => "UnknownFormat",
            ParseError::TimeParse { .. } => "TimeParse",
            ParseError::Regex { .. } => "Regex",
            ParseError::Configuration { .. } => "Configuration",
            ParseError::Io { .. } => "Io",
        }
    }
}
