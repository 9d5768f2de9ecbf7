use crate::models::{EventTime, Record};

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The line matched and its time resolved
    Matched { time: EventTime, record: Record },
    /// The line is not in this dialect, or its time was dropped
    NotMatched,
}

impl ParseOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, ParseOutcome::Matched { .. })
    }

    pub fn time(&self) -> Option<EventTime> {
        match self {
            ParseOutcome::Matched { time, .. } => Some(*time),
            ParseOutcome::NotMatched => None,
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            ParseOutcome::Matched { record, .. } => Some(record),
            ParseOutcome::NotMatched => None,
        }
    }

    /// The nullable `(time, record)` pair hosts expect; both or neither are set
    pub fn into_parts(self) -> (Option<EventTime>, Option<Record>) {
        match self {
            ParseOutcome::Matched { time, record } => (Some(time), Some(record)),
            ParseOutcome::NotMatched => (None, None),
        }
    }
}
