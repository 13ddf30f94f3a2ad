use std::path::Path;

use colored::Colorize;

use crate::sync::ConversionOutcome;

/// Receives every completed conversion
pub trait ConversionObserver {
    fn converted(&self, source: &Path, destination: &Path, outcome: ConversionOutcome);
}

/// Prints `source -> destination` lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn new() -> Self {
        let colors = supports_color::on(supports_color::Stream::Stdout).is_some();
        colored::control::set_override(colors);
        Self
    }
}

impl ConversionObserver for ConsoleObserver {
    fn converted(&self, source: &Path, destination: &Path, outcome: ConversionOutcome) {
        let line = format!(
            "{} {} {}",
            source.display().to_string().cyan(),
            "->".dimmed(),
            destination.display().to_string().green()
        );
        match outcome {
            ConversionOutcome::Written => println!("{line}"),
            ConversionOutcome::Unchanged => println!("{line} {}", "(unchanged)".dimmed()),
        }
    }
}
