use crate::error::ParseError;
use crate::models::EventTime;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use parking_lot::Mutex;
#[cfg(test)]
use parking_lot::MutexGuard;

/// Last resolved raw string. Access lines arrive in bursts within the same
/// second, so a single entry catches most repeats.
#[derive(Debug, Default)]
pub(crate) struct TimeCache {
    last: Option<(String, EventTime)>,
    hits: u64,
}

/// Resolves raw time strings against one layout.
///
/// The cache is the resolver's only mutable state and lives behind a lock
/// owned by this instance; resolvers never share it.
#[derive(Debug)]
pub struct TimestampResolver {
    layout: String,
    has_zone: bool,
    default_offset: FixedOffset,
    state: Mutex<TimeCache>,
}

impl TimestampResolver {
    pub fn new(layout: &str, default_offset: FixedOffset) -> Self {
        Self {
            layout: layout.to_string(),
            has_zone: layout.contains("%z") || layout.contains("%:z"),
            default_offset,
            state: Mutex::new(TimeCache::default()),
        }
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    pub fn resolve(&self, raw: &str) -> Result<EventTime, ParseError> {
        let mut state = self.state.lock();

        if let Some((last_raw, last_time)) = &state.last {
            if last_raw == raw {
                let time = *last_time;
                state.hits += 1;
                return Ok(time);
            }
        }

        let time = self.parse_uncached(raw)?;
        state.last = Some((raw.to_string(), time));
        Ok(time)
    }

    /// Number of resolutions served from the cache
    pub fn cache_hits(&self) -> u64 {
        self.state.lock().hits
    }

    #[cfg(test)]
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, TimeCache> {
        self.state.lock()
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    fn parse_uncached(&self, raw: &str) -> Result<EventTime, ParseError> {
        if self.has_zone {
            return DateTime::parse_from_str(raw, &self.layout).map_err(|e| self.failure(raw, e.to_string()));
        }

        let (naive, remainder) = NaiveDateTime::parse_and_remainder(raw, &self.layout)
            .map_err(|e| self.failure(raw, e.to_string()))?;
        let (naive, utc_marker) = self.apply_fraction(raw, naive, remainder)?;
        let offset = if utc_marker {
            FixedOffset::east_opt(0).ok_or_else(|| self.failure(raw, "invalid UTC offset".to_string()))?
        } else {
            self.default_offset
        };

        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| self.failure(raw, "ambiguous local time".to_string()))
    }

    /// Zone-less layouts accept a trailing `.fff` and/or `Z`, as envoy emits.
    /// The flag is true when `Z` pins the time to UTC.
    fn apply_fraction(&self, raw: &str, naive: NaiveDateTime, remainder: &str) -> Result<(NaiveDateTime, bool), ParseError> {
        let mut rest = remainder;
        let mut naive = naive;

        if let Some(fraction) = rest.strip_prefix('.') {
            let digits: &str = &fraction[..fraction.bytes().take_while(|b| b.is_ascii_digit()).count()];
            if digits.is_empty() || digits.len() > 9 {
                return Err(self.failure(raw, format!("invalid fractional seconds '.{}'", digits)));
            }
            let nanos: u32 = format!("{:0<9}", digits)
                .parse()
                .map_err(|_| self.failure(raw, format!("invalid fractional seconds '.{}'", digits)))?;
            naive = naive
                .with_nanosecond(nanos)
                .ok_or_else(|| self.failure(raw, "fractional seconds out of range".to_string()))?;
            rest = &fraction[digits.len()..];
        }

        match rest {
            "" => Ok((naive, false)),
            "Z" => Ok((naive, true)),
            other => Err(self.failure(raw, format!("trailing input '{}'", other))),
        }
    }

    fn failure(&self, raw: &str, message: String) -> ParseError {
        ParseError::TimeParse {
            input: raw.to_string(),
            layout: self.layout.clone(),
            message,
        }
    }
}

/// Parse a UTC offset such as `+09:00`, `-0700`, `Z` or `UTC`
pub fn parse_offset(text: &str) -> Result<FixedOffset, ParseError> {
    let invalid = || ParseError::Configuration {
        parameter: "default_offset".to_string(),
        message: format!("Invalid UTC offset '{}', expected e.g. +00:00", text),
    };

    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
