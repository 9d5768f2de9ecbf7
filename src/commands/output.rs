use crate::cli::OutputFormat;
use crate::models::{EventTime, FieldValue, Record};
use crate::statistics::ParsingStatistics;
use colored::*;
use std::io::{self, Write};

pub struct OutputFormatter {
    format: OutputFormat,
    written: usize,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, written: 0 }
    }

    pub fn print_header(&self, writer: &mut impl Write) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(writer, "{}", "─".repeat(100).dimmed()),
            OutputFormat::Json => writeln!(writer, "["),
            _ => Ok(()),
        }
    }

    pub fn print_footer(&self, writer: &mut impl Write) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.written > 0 => writeln!(writer, "\n]"),
            OutputFormat::Json => writeln!(writer, "]"),
            _ => Ok(()),
        }
    }

    pub fn write_record(&mut self, writer: &mut impl Write, line: &str, time: &EventTime, record: &Record) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(writer, "{}", format_table(time, record))?,
            OutputFormat::Ndjson => writeln!(writer, "{}", event_to_json(time, record)?)?,
            OutputFormat::Json => {
                if self.written > 0 {
                    writeln!(writer, ",")?;
                }
                let pretty = serde_json::to_string_pretty(&event_to_json(time, record)?)?;
                write!(writer, "{}", indent(&pretty))?;
            }
            OutputFormat::Raw => writeln!(writer, "{}", line)?,
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

pub fn event_to_json(time: &EventTime, record: &Record) -> serde_json::Result<serde_json::Value> {
    let mut obj = serde_json::Map::new();
    obj.insert("timestamp".to_string(), serde_json::Value::String(time.to_rfc3339()));
    obj.insert("record".to_string(), serde_json::to_value(record)?);
    Ok(serde_json::Value::Object(obj))
}

fn format_table(time: &EventTime, record: &Record) -> String {
    let mut output = String::new();
    output.push_str(&format!("{} ", time.format("%Y-%m-%d %H:%M:%S %z").to_string().cyan()));

    let fields: Vec<String> = record
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                FieldValue::Null => "-".dimmed().to_string(),
                FieldValue::Int(n) => n.to_string().yellow().to_string(),
                FieldValue::Str(s) => s.clone(),
            };
            format!("{}={}", key.dimmed(), rendered)
        })
        .collect();
    output.push_str(&fields.join(" "));

    output
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("  {}", l)).collect::<Vec<_>>().join("\n")
}

pub fn print_stats_summary(stats: &ParsingStatistics) {
    eprintln!("\n{}", "═".repeat(50).cyan());
    eprintln!("{}", "SUMMARY".cyan().bold());
    eprintln!("{}", "═".repeat(50).cyan());
    eprintln!("Total lines:      {}", stats.total_lines.to_string().white().bold());
    eprintln!("Matched:          {} ({:.1}%)", stats.matched.to_string().green(), stats.match_rate());
    eprintln!("Not matched:      {} ({:.1}%)", stats.not_matched.to_string().yellow(), stats.no_match_rate());
    eprintln!("Time failures:    {}", stats.time_failures.to_string().red());

    if !stats.dialect_distribution.is_empty() {
        eprintln!("\n{}", "Dialects:".cyan());
        for line in dialect_lines(stats) {
            eprintln!("{}", line);
        }
    }
}

fn dialect_lines(stats: &ParsingStatistics) -> Vec<String> {
    let mut counts: Vec<_> = stats.dialect_distribution.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.identifier().cmp(b.0.identifier())));
    counts
        .into_iter()
        .map(|(dialect, count)| format!("  {:<16}{}", dialect.identifier(), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dialect;
    use crate::parse_result::ParseOutcome;
    use chrono::DateTime;

    fn sample() -> (EventTime, Record) {
        let time = DateTime::parse_from_rfc3339("2000-10-10T13:55:36-07:00").unwrap();
        let mut record = Record::new();
        record.push("method", FieldValue::from("GET"));
        record.push("code", FieldValue::Int(200));
        record.push("user", FieldValue::Null);
        (time, record)
    }

    #[test]
    fn test_ndjson_output() {
        let (time, record) = sample();
        let mut formatter = OutputFormatter::new(OutputFormat::Ndjson);
        let mut buffer = Vec::new();
        formatter.write_record(&mut buffer, "raw", &time, &record).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "{\"timestamp\":\"2000-10-10T13:55:36-07:00\",\"record\":{\"method\":\"GET\",\"code\":200,\"user\":null}}\n"
        );
        assert_eq!(formatter.written(), 1);
    }

    #[test]
    fn test_json_array_output_is_valid() {
        let (time, record) = sample();
        let mut formatter = OutputFormatter::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        formatter.print_header(&mut buffer).unwrap();
        formatter.write_record(&mut buffer, "a", &time, &record).unwrap();
        formatter.write_record(&mut buffer, "b", &time, &record).unwrap();
        formatter.print_footer(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(2));
        assert_eq!(parsed[1]["record"]["code"], 200);
    }

    #[test]
    fn test_empty_json_array() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        formatter.print_header(&mut buffer).unwrap();
        formatter.print_footer(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[test]
    fn test_dialect_lines_sorted_by_count() {
        let mut stats = ParsingStatistics::new();
        stats.record(Dialect::Envoy, &Ok(ParseOutcome::NotMatched));
        stats.record(Dialect::Nginx, &Ok(ParseOutcome::NotMatched));
        stats.record(Dialect::Nginx, &Ok(ParseOutcome::NotMatched));

        assert_eq!(
            dialect_lines(&stats),
            vec![format!("  {:<16}{}", "nginx", 2), format!("  {:<16}{}", "envoy", 1)]
        );
    }

    #[test]
    fn test_raw_output_echoes_line() {
        let (time, record) = sample();
        let mut formatter = OutputFormatter::new(OutputFormat::Raw);
        let mut buffer = Vec::new();
        formatter.write_record(&mut buffer, "original line", &time, &record).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "original line\n");
    }
}
