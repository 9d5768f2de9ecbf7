use crate::error::ParseError;
use crate::models::Dialect;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the capture group holding the raw event time in every dialect
pub const TIME_CAPTURE: &str = "time";

/// How a trace-context field decides it carries no trace at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceBlank {
    /// The raw value is the literal `-`
    Sentinel,
    /// The capture group did not participate in the match
    Absent,
}

/// Per-field transform, carrying the output key(s) it writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Copy raw value, `-` becomes null
    PassThrough { key: &'static str },
    /// Free-text field, `-` becomes null, empty strings are kept
    Sentinel { key: &'static str },
    /// Permissive integer, `-` becomes null
    Integer { key: &'static str },
    /// Permissive integer where zero becomes null
    StatusCode { key: &'static str },
    /// Milliseconds rendered as a seconds string
    ScaledDuration { key: &'static str, suffix: &'static str },
    /// `<trace>/<span>[/...]` split into two keys
    TraceSplit {
        trace_key: &'static str,
        span_key: &'static str,
        blank_on: TraceBlank,
    },
}

impl Transform {
    pub fn output_keys(&self) -> impl Iterator<Item = &'static str> {
        let (first, second) = match *self {
            Transform::TraceSplit { trace_key, span_key, .. } => (trace_key, Some(span_key)),
            Transform::PassThrough { key }
            | Transform::Sentinel { key }
            | Transform::Integer { key }
            | Transform::StatusCode { key }
            | Transform::ScaledDuration { key, .. } => (key, None),
        };
        std::iter::once(first).chain(second)
    }
}

/// Binds one capture group to its transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub capture: &'static str,
    pub transform: Transform,
}

const fn rule(capture: &'static str, transform: Transform) -> FieldRule {
    FieldRule { capture, transform }
}

const APACHE2_PATTERN: &str = r#"^(?P<host>[^ ]*) [^ ]* (?P<user>[^ ]*) \[(?P<time>[^\]]*)\] "(?P<method>\S+)(?: +(?P<path>(?:[^"]|\\.)*?)(?: +\S*)?)?" (?P<code>[^ ]*) (?P<response_size>[^ ]*)(?: "(?P<referer>(?:[^"]|\\.)*)" "(?P<agent>[^"]*)"(?:\s+"?(?P<x_forwarded_for>[^"]*)"?)?) "(?P<latency>[^"]*)" "(?P<x_cloud_trace_context>[^"]*)"?$"#;

const NGINX_PATTERN: &str = r#"^(?P<host>[^ ]*) [^ ]* (?P<user>[^ ]*) \[(?P<time>[^\]]*)\] "(?P<method>\S+)(?: +(?P<path>(?:[^"]|\\.)*?)(?: +\S*)?)?" (?P<code>[^ ]*) (?P<response_size>[^ ]*)(?: "(?P<referer>(?:[^"]|\\.)*)" "(?P<agent>[^"]*)"(?:\s+"?(?P<x_forwarded_for>[^"]*)"?)?) "(?P<latency>[^"]*)" "(?P<http_x_cloud_trace_context>[^"]*)"?$"#;

const ENVOY_PATTERN: &str = r#"^\[(?P<time>[^\]]*)\] "(?P<method>\S+)(?: +(?P<path>(?:[^"]|\\.)*?)(?: +\S*)?) (?P<protocol>\S+)?" (?P<response_code>\S+) (?P<response_flags>\S+) (?P<bytes_received>\S+) (?P<bytes_sent>\S+) (?P<duration>\S+) (?P<x_envoy_upstream_service_time>\S+) "(?P<x_forwarded_for>[^"]*)" "(?P<user_agent>[^"]*)" "(?P<x_request_id>[^"]*)" "(?P<authority>[^"]*)" "(?P<upstream_host>[^"]*)" "(?P<x_cloud_trace_context>[^"]*)"?$"#;

const CLF_TIME_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";
const ENVOY_TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

const APACHE2_RULES: &[FieldRule] = &[
    rule("host", Transform::Sentinel { key: "host" }),
    rule("user", Transform::Sentinel { key: "user" }),
    rule("method", Transform::PassThrough { key: "method" }),
    rule("path", Transform::PassThrough { key: "path" }),
    rule("code", Transform::StatusCode { key: "code" }),
    rule("response_size", Transform::Integer { key: "response_size" }),
    rule("referer", Transform::Sentinel { key: "referer" }),
    rule("agent", Transform::Sentinel { key: "agent" }),
    rule("x_forwarded_for", Transform::Sentinel { key: "x_forwarded_for" }),
    rule("latency", Transform::ScaledDuration { key: "latency", suffix: "" }),
    rule(
        "x_cloud_trace_context",
        Transform::TraceSplit {
            trace_key: "x_cloud_trace_context",
            span_key: "span_id",
            blank_on: TraceBlank::Sentinel,
        },
    ),
];

// nginx logs $request_time, which is already in seconds
const NGINX_RULES: &[FieldRule] = &[
    rule("host", Transform::Sentinel { key: "host" }),
    rule("user", Transform::Sentinel { key: "user" }),
    rule("method", Transform::PassThrough { key: "method" }),
    rule("path", Transform::PassThrough { key: "path" }),
    rule("code", Transform::StatusCode { key: "code" }),
    rule("response_size", Transform::Integer { key: "response_size" }),
    rule("referer", Transform::Sentinel { key: "referer" }),
    rule("agent", Transform::Sentinel { key: "agent" }),
    rule("x_forwarded_for", Transform::Sentinel { key: "x_forwarded_for" }),
    rule("latency", Transform::Sentinel { key: "latency" }),
    rule(
        "http_x_cloud_trace_context",
        Transform::TraceSplit {
            trace_key: "http_x_cloud_trace_context",
            span_key: "span_id",
            blank_on: TraceBlank::Sentinel,
        },
    ),
];

const ENVOY_RULES: &[FieldRule] = &[
    rule("method", Transform::PassThrough { key: "method" }),
    rule("path", Transform::PassThrough { key: "path" }),
    rule("protocol", Transform::PassThrough { key: "protocol" }),
    rule("response_code", Transform::StatusCode { key: "response_code" }),
    rule("response_flags", Transform::PassThrough { key: "response_flags" }),
    rule("bytes_received", Transform::Integer { key: "bytes_received" }),
    rule("bytes_sent", Transform::Integer { key: "bytes_sent" }),
    rule("duration", Transform::ScaledDuration { key: "duration", suffix: "s" }),
    rule(
        "x_envoy_upstream_service_time",
        Transform::PassThrough { key: "x_envoy_upstream_service_time" },
    ),
    rule("x_forwarded_for", Transform::Sentinel { key: "x_forwarded_for" }),
    rule("user_agent", Transform::Sentinel { key: "user_agent" }),
    rule("authority", Transform::PassThrough { key: "authority" }),
    rule("upstream_host", Transform::PassThrough { key: "upstream_host" }),
    rule(
        "x_cloud_trace_context",
        Transform::TraceSplit {
            trace_key: "trace",
            span_key: "span_id",
            blank_on: TraceBlank::Absent,
        },
    ),
];

/// Pattern text and time layout, for diagnostics only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patterns {
    pub format: String,
    pub time_format: String,
}

/// Immutable grammar, time layout and field rules of one dialect
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    dialect: Dialect,
    pattern_text: &'static str,
    pattern: Regex,
    time_layout: &'static str,
    rules: &'static [FieldRule],
}

impl FormatDescriptor {
    /// Build the descriptor named by a format identifier
    pub fn build(format_id: &str) -> Result<Self, ParseError> {
        let dialect: Dialect = format_id.parse()?;
        Self::for_dialect(dialect)
    }

    pub fn for_dialect(dialect: Dialect) -> Result<Self, ParseError> {
        let (pattern_text, time_layout, rules) = match dialect {
            Dialect::Apache2 => (APACHE2_PATTERN, CLF_TIME_LAYOUT, APACHE2_RULES),
            Dialect::Nginx => (NGINX_PATTERN, CLF_TIME_LAYOUT, NGINX_RULES),
            Dialect::Envoy => (ENVOY_PATTERN, ENVOY_TIME_LAYOUT, ENVOY_RULES),
        };

        let pattern = Regex::new(pattern_text).map_err(|e| ParseError::Regex {
            pattern: pattern_text.to_string(),
            message: e.to_string(),
        })?;

        let descriptor = Self {
            dialect,
            pattern_text,
            pattern,
            time_layout,
            rules,
        };
        descriptor.validate()?;

        Ok(descriptor)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pattern(&self) -> &str {
        self.pattern_text
    }

    pub fn time_layout(&self) -> &str {
        self.time_layout
    }

    pub fn rules(&self) -> &[FieldRule] {
        self.rules
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.pattern
    }

    /// Output keys in record order, excluding the optional raw time
    pub fn output_keys(&self) -> Vec<&'static str> {
        self.rules.iter().flat_map(|r| r.transform.output_keys()).collect()
    }

    pub fn patterns(&self) -> Patterns {
        Patterns {
            format: self.pattern_text.to_string(),
            time_format: self.time_layout.to_string(),
        }
    }

    /// Check that every rule names a real group and output keys are unique
    fn validate(&self) -> Result<(), ParseError> {
        let groups: HashSet<&str> = self.pattern.capture_names().flatten().collect();

        if !groups.contains(TIME_CAPTURE) {
            return Err(ParseError::Configuration {
                parameter: format!("{}.pattern", self.dialect),
                message: format!("Pattern has no '{}' capture group", TIME_CAPTURE),
            });
        }

        let mut seen = HashSet::new();
        for rule in self.rules {
            if !groups.contains(rule.capture) {
                return Err(ParseError::Configuration {
                    parameter: format!("{}.field_rules.{}", self.dialect, rule.capture),
                    message: format!("Capture group '{}' does not exist in pattern", rule.capture),
                });
            }
            for key in rule.transform.output_keys() {
                if !seen.insert(key) {
                    return Err(ParseError::Configuration {
                        parameter: format!("{}.field_rules.{}", self.dialect, rule.capture),
                        message: format!("Output key '{}' is declared twice", key),
                    });
                }
            }
        }

        Ok(())
    }
}
