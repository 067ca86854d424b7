use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ClearResult, FetchResult, ProgressEvent, ProgressSink, StatusResult};
use crate::merge::{MergeSummary, OutcomeStatus};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Machine-readable results on stdout; progress is dropped.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_merge(result: &MergeSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_status(result: &StatusResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr and short human summaries on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_fetch(result: &FetchResult) {
        for item in &result.items {
            println!("{} {} ({}) -> {}", item.species, item.kind, item.action, item.path);
        }
        for failure in &result.failures {
            println!("{} failed: {}", failure.species, failure.reason);
        }
    }

    pub fn print_merge(result: &MergeSummary) {
        for outcome in &result.species {
            match outcome.status {
                OutcomeStatus::Written => println!(
                    "{} ({}): {} rows",
                    outcome.sheet_name, outcome.species, outcome.rows
                ),
                OutcomeStatus::Skipped => println!(
                    "{} ({}): skipped, {}",
                    outcome.sheet_name,
                    outcome.species,
                    outcome.reason.as_deref().unwrap_or("unknown reason")
                ),
            }
        }
    }

    pub fn print_status(result: &StatusResult) {
        println!("data directory: {}", result.data_dir);
        let mark = |present: bool| if present { "yes" } else { "-" };
        for entry in &result.species {
            println!(
                "{:<4} {:<12} table={} pre={} mature={} star={} gff={} downloaded={}",
                entry.species.code(),
                entry.sheet_name,
                mark(entry.table),
                mark(entry.precursor),
                mark(entry.mature),
                mark(entry.star),
                mark(entry.coordinates),
                entry.downloaded_at.as_deref().unwrap_or("-")
            );
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
