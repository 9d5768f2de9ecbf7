pub mod models;
pub mod error;
pub mod config;
pub mod descriptor;
pub mod matcher;
pub mod normalizer;
pub mod timestamp;
pub mod parse_result;
pub mod access_parser;
pub mod statistics;
pub mod cli;
pub mod commands;

#[cfg(test)]
mod concurrency_tests;

pub use models::{Dialect, EventTime, FieldValue, Record, RAW_TIME_KEY};
pub use error::ParseError;
pub use config::{ParserOptions, TimeFailurePolicy};
pub use descriptor::{FieldRule, FormatDescriptor, Patterns, TraceBlank, Transform};
pub use matcher::{match_line, CaptureSet};
pub use normalizer::normalize;
pub use timestamp::TimestampResolver;
pub use parse_result::ParseOutcome;
pub use access_parser::AccessLogParser;
pub use statistics::ParsingStatistics;
