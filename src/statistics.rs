use crate::error::ParseError;
use crate::models::Dialect;
use crate::parse_result::ParseOutcome;
use serde::Serialize;
use std::collections::HashMap;

/// Per-run parsing counters for monitoring and summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsingStatistics {
    /// Total number of lines processed
    pub total_lines: usize,
    /// Lines that produced a record
    pub matched: usize,
    /// Lines that did not match, or whose time was dropped
    pub not_matched: usize,
    /// Lines whose time failure was surfaced as an error
    pub time_failures: usize,
    /// Lines processed per dialect
    pub dialect_distribution: HashMap<Dialect, usize>,
}

impl ParsingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dialect: Dialect, result: &Result<ParseOutcome, ParseError>) {
        self.total_lines += 1;
        *self.dialect_distribution.entry(dialect).or_insert(0) += 1;

        match result {
            Ok(ParseOutcome::Matched { .. }) => self.matched += 1,
            Ok(ParseOutcome::NotMatched) => self.not_matched += 1,
            Err(_) => self.time_failures += 1,
        }
    }

    /// Matched lines as a percentage
    pub fn match_rate(&self) -> f64 {
        self.percentage(self.matched)
    }

    /// Non-matching lines as a percentage
    pub fn no_match_rate(&self) -> f64 {
        self.percentage(self.not_matched)
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (count as f64 / self.total_lines as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::DateTime;
    use quickcheck_macros::quickcheck;

    fn matched() -> Result<ParseOutcome, ParseError> {
        Ok(ParseOutcome::Matched {
            time: DateTime::parse_from_rfc3339("2000-10-10T13:55:36-07:00").unwrap(),
            record: Record::new(),
        })
    }

    fn time_failure() -> Result<ParseOutcome, ParseError> {
        Err(ParseError::TimeParse {
            input: "x".to_string(),
            layout: "%Y".to_string(),
            message: "bad".to_string(),
        })
    }

    #[test]
    fn test_record_outcomes() {
        let mut stats = ParsingStatistics::new();
        stats.record(Dialect::Nginx, &matched());
        stats.record(Dialect::Nginx, &matched());
        stats.record(Dialect::Nginx, &Ok(ParseOutcome::NotMatched));
        stats.record(Dialect::Nginx, &time_failure());

        assert_eq!(stats.total_lines, 4);
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.not_matched, 1);
        assert_eq!(stats.time_failures, 1);
        assert_eq!(stats.dialect_distribution.get(&Dialect::Nginx), Some(&4));
        assert_eq!(stats.match_rate(), 50.0);
        assert_eq!(stats.no_match_rate(), 25.0);
    }

    #[test]
    fn test_empty_rates() {
        let stats = ParsingStatistics::new();
        assert_eq!(stats.match_rate(), 0.0);
        assert_eq!(stats.no_match_rate(), 0.0);
    }

    #[quickcheck]
    fn prop_counts_always_add_up(outcomes: Vec<u8>) -> bool {
        let mut stats = ParsingStatistics::new();
        for o in &outcomes {
            let result = match o % 3 {
                0 => matched(),
                1 => Ok(ParseOutcome::NotMatched),
                _ => time_failure(),
            };
            stats.record(Dialect::Envoy, &result);
        }
        stats.total_lines == outcomes.len()
            && stats.matched + stats.not_matched + stats.time_failures == stats.total_lines
    }
}
