use crate::access_parser::AccessLogParser;
use crate::cli::ParseArgs;
use crate::commands::output::{print_stats_summary, OutputFormatter};
use crate::config::{ParserOptions, TimeFailurePolicy};
use crate::parse_result::ParseOutcome;
use crate::statistics::ParsingStatistics;
use crossbeam_channel::{bounded, Receiver, Sender};
use glob::glob;
use std::fs::File;
use std::io::{self, stdin, stdout, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, warn};

pub fn run_parse(args: ParseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&args)?;
    let parser = AccessLogParser::new(&args.format, options)?;

    let files = expand_globs(&args.files)?;
    let batch_size = args.batch_size.max(1);
    info!(dialect = %parser.dialect(), files = files.len(), batch_size, "starting parse");

    let (tx, rx) = bounded::<io::Result<Vec<String>>>(4);
    let reader = thread::spawn(move || read_batches(&files, batch_size, &tx));

    let mut formatter = OutputFormatter::new(args.output);
    let mut stats = ParsingStatistics::new();
    let stdout = stdout();
    let mut output = stdout.lock();
    let emitted = emit(&parser, &rx, &mut formatter, &mut stats, &mut output, args.limit, args.unmatched);
    // Dropping the receiver unblocks a reader still sending after an early stop
    drop(rx);
    output.flush()?;
    emitted?;

    match reader.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err("reader thread panicked".into()),
    }

    debug!(total = stats.total_lines, matched = stats.matched, "parse finished");
    if args.summary {
        print_stats_summary(&stats);
    }

    Ok(())
}

/// Write every batch between header and footer; the footer is written even when a batch fails
fn emit(
    parser: &AccessLogParser,
    rx: &Receiver<io::Result<Vec<String>>>,
    formatter: &mut OutputFormatter,
    stats: &mut ParsingStatistics,
    output: &mut impl Write,
    limit: Option<usize>,
    unmatched: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    formatter.print_header(output)?;
    let streamed = stream_records(parser, rx, formatter, stats, output, limit, unmatched);
    formatter.print_footer(output)?;
    streamed
}

fn stream_records(
    parser: &AccessLogParser,
    rx: &Receiver<io::Result<Vec<String>>>,
    formatter: &mut OutputFormatter,
    stats: &mut ParsingStatistics,
    output: &mut impl Write,
    limit: Option<usize>,
    unmatched: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for batch in rx.iter() {
        let lines = batch?;
        let results = parser.parse_batch(&lines);

        for (line, result) in lines.iter().zip(results) {
            stats.record(parser.dialect(), &result);
            match result {
                Ok(ParseOutcome::Matched { time, record }) => {
                    if limit.is_some_and(|limit| formatter.written() >= limit) {
                        return Ok(());
                    }
                    formatter.write_record(output, line, &time, &record)?;
                }
                Ok(ParseOutcome::NotMatched) => {
                    if unmatched {
                        eprintln!("{}", line);
                    }
                }
                Err(e) => eprintln!("[{}] {}: {}", e.kind(), e, line),
            }
        }
    }
    Ok(())
}

fn build_options(args: &ParseArgs) -> Result<ParserOptions, Box<dyn std::error::Error>> {
    let mut options = match &args.config {
        Some(path) => ParserOptions::load(path)?,
        None => ParserOptions::default(),
    };
    if args.keep_time {
        options = options.with_keep_raw_time(true);
    }
    if args.strict_time {
        options = options.with_time_failure(TimeFailurePolicy::Surface);
    }
    if let Some(offset) = &args.default_offset {
        options = options.with_default_offset(offset.clone());
    }
    options.offset()?;
    Ok(options)
}

/// Stream non-empty lines in fixed-size batches; stdin when no files are given
fn read_batches(files: &[PathBuf], batch_size: usize, tx: &Sender<io::Result<Vec<String>>>) -> io::Result<()> {
    if files.is_empty() || files.iter().all(|f| f.as_os_str() == "-") {
        return send_lines(stdin().lock(), batch_size, tx);
    }

    for path in files {
        if path.as_os_str() == "-" {
            send_lines(stdin().lock(), batch_size, tx)?;
            continue;
        }
        debug!(path = %path.display(), "reading file");
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open file");
                let _ = tx.send(Err(e));
                return Ok(());
            }
        };
        send_lines(BufReader::new(file), batch_size, tx)?;
    }
    Ok(())
}

fn send_lines(reader: impl BufRead, batch_size: usize, tx: &Sender<io::Result<Vec<String>>>) -> io::Result<()> {
    let mut batch = Vec::with_capacity(batch_size);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        batch.push(line);
        if batch.len() == batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            if tx.send(Ok(full)).is_err() {
                return Ok(());
            }
        }
    }
    if !batch.is_empty() {
        let _ = tx.send(Ok(batch));
    }
    Ok(())
}

pub fn expand_globs(patterns: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern_str = pattern.to_string_lossy();
        if pattern_str.contains('*') || pattern_str.contains('?') {
            for entry in glob(&pattern_str)? {
                files.push(entry?);
            }
        } else {
            files.push(pattern.clone());
        }
    }
    Ok(files)
}
