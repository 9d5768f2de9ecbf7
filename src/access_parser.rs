use crate::config::{ParserOptions, TimeFailurePolicy};
use crate::descriptor::{FormatDescriptor, Patterns, TIME_CAPTURE};
use crate::error::ParseError;
use crate::matcher::match_line;
use crate::models::{Dialect, FieldValue, RAW_TIME_KEY};
use crate::normalizer::normalize;
use crate::parse_result::ParseOutcome;
use crate::timestamp::TimestampResolver;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parser for one access-log dialect.
///
/// Safe to share across threads. Matching and normalization take no locks;
/// only time resolution serializes, and only against this instance.
#[derive(Debug)]
pub struct AccessLogParser {
    descriptor: Arc<FormatDescriptor>,
    resolver: TimestampResolver,
    options: ParserOptions,
}

impl AccessLogParser {
    /// Create a parser for a format identifier (`apache2`, `nginx`, `envoy`)
    pub fn new(format_id: &str, options: ParserOptions) -> Result<Self, ParseError> {
        let descriptor = FormatDescriptor::build(format_id)?;
        Self::from_descriptor(Arc::new(descriptor), options)
    }

    pub fn for_dialect(dialect: Dialect, options: ParserOptions) -> Result<Self, ParseError> {
        let descriptor = FormatDescriptor::for_dialect(dialect)?;
        Self::from_descriptor(Arc::new(descriptor), options)
    }

    fn from_descriptor(descriptor: Arc<FormatDescriptor>, options: ParserOptions) -> Result<Self, ParseError> {
        let offset = options.offset()?;
        let resolver = TimestampResolver::new(descriptor.time_layout(), offset);

        debug!(
            dialect = %descriptor.dialect(),
            keep_raw_time = options.keep_raw_time,
            time_failure = ?options.time_failure,
            "access log parser configured"
        );

        Ok(Self {
            descriptor,
            resolver,
            options,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.descriptor.dialect()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    pub fn patterns(&self) -> Patterns {
        self.descriptor.patterns()
    }

    /// Parse one line.
    ///
    /// `Err` is only returned for a time failure under
    /// [`TimeFailurePolicy::Surface`]; everything else is an outcome.
    pub fn parse(&self, line: &str) -> Result<ParseOutcome, ParseError> {
        let Some(captures) = match_line(&self.descriptor, line) else {
            trace!(dialect = %self.dialect(), "line does not match");
            return Ok(ParseOutcome::NotMatched);
        };

        let raw_time = captures.get(TIME_CAPTURE).unwrap_or_default();
        let time = match self.resolver.resolve(raw_time) {
            Ok(time) => time,
            Err(err) => {
                return match self.options.time_failure {
                    TimeFailurePolicy::Drop => {
                        debug!(dialect = %self.dialect(), error = %err, "dropping line with unparseable time");
                        Ok(ParseOutcome::NotMatched)
                    }
                    TimeFailurePolicy::Surface => Err(err),
                };
            }
        };

        let mut record = normalize(&captures, self.descriptor.rules());
        if self.options.keep_raw_time {
            record.push(RAW_TIME_KEY, FieldValue::from(raw_time));
        }

        Ok(ParseOutcome::Matched { time, record })
    }

    /// Parse many lines on the rayon pool; results keep input order
    pub fn parse_batch<S>(&self, lines: &[S]) -> Vec<Result<ParseOutcome, ParseError>>
    where
        S: AsRef<str> + Sync,
    {
        lines.par_iter().map(|line| self.parse(line.as_ref())).collect()
    }

    #[cfg(test)]
    pub(crate) fn resolver(&self) -> &TimestampResolver {
        &self.resolver
    }
}

/// Clones share the descriptor; each clone gets its own time state and lock
impl Clone for AccessLogParser {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            resolver: TimestampResolver::new(self.resolver.layout(), self.resolver.default_offset()),
            options: self.options.clone(),
        }
    }
}
