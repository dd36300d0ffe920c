// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::batch::Summary;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with timing
    Normal,
    /// Only the final result line
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Wording of a batch summary line, e.g. "copied" / "source images".
#[derive(Debug, Clone, Copy)]
pub struct SummaryWording {
    pub verb: &'static str,
    pub noun: &'static str,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print an informational message (normal mode only).
    pub fn info(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a plain success message.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message: Some(message),
                duration_secs: self.elapsed_secs(),
                ..JsonEvent::default()
            }),
        }
    }

    /// Print a command result: `text` for humans, `data` as a JSON event.
    pub fn data<T: Serialize>(&self, text: &str, data: &T) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => print!("{text}"),
            OutputMode::Json => match serde_json::to_value(data) {
                Ok(value) => emit(&JsonEvent {
                    event: "result",
                    data: Some(value),
                    duration_secs: self.elapsed_secs(),
                    ..JsonEvent::default()
                }),
                Err(e) => tracing::error!("cannot serialize result: {}", e),
            },
        }
    }

    /// Print the final tally of a batch run. Failures are always reported.
    pub fn summary(&self, wording: SummaryWording, summary: &Summary) {
        let line = format!(
            "Successfully {} {} {}. Errors with {} {}.",
            wording.verb, summary.success_count, wording.noun, summary.failure_count, wording.noun
        );

        match self.mode {
            OutputMode::Normal => match self.elapsed_secs() {
                Some(elapsed) => println!("{line} ({elapsed:.1}s)"),
                None => println!("{line}"),
            },
            OutputMode::Quiet => println!("{line}"),
            OutputMode::Json => emit(&JsonEvent {
                event: "summary",
                message: Some(&line),
                success_count: Some(summary.success_count),
                failure_count: Some(summary.failure_count),
                duration_secs: self.elapsed_secs(),
                ..JsonEvent::default()
            }),
        }
    }

    /// Print an error message to stderr.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message: Some(message),
                    duration_secs: self.elapsed_secs(),
                    ..JsonEvent::default()
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

fn emit(event: &JsonEvent<'_>) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize, Default)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}
