use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Note(String),
    Warning(String),
    Started { url: String, destination: PathBuf },
    Progress(ProgressUpdate),
    Completed { path: PathBuf, bytes_written: u64 },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub transferred: u64,
    pub total: Option<u64>,
}

impl ProgressUpdate {
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .map(|total| self.transferred as f64 / total as f64)
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Clamps raw byte counts against the advisory total.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: Option<u64>,
    reported: u64,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|total| *total > 0),
            reported: 0,
        }
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn advance_to(&mut self, raw: u64) -> Option<ProgressUpdate> {
        let position = match self.total {
            Some(total) => raw.min(total),
            None => raw,
        };
        if position <= self.reported {
            return None;
        }
        self.reported = position;
        Some(ProgressUpdate {
            transferred: position,
            total: self.total,
        })
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Note(message) => info!("{message}"),
            ProgressEvent::Warning(message) => warn!("{message}"),
            ProgressEvent::Started { url, destination } => {
                info!(%url, destination = %destination.display(), "download started")
            }
            ProgressEvent::Progress(update) => {
                debug!(transferred = update.transferred, total = ?update.total, "progress")
            }
            ProgressEvent::Completed {
                path,
                bytes_written,
            } => info!(path = %path.display(), bytes_written, "download complete"),
            ProgressEvent::Failed { message } => error!("{message}"),
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:<28} [{wide_bar:.cyan/blue}] {binary_bytes}/{binary_total_bytes} ({eta})")
        .expect("invalid progress bar template")
        .progress_chars("#>-")
}

fn pending_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg:<28} {binary_bytes}")
        .expect("invalid spinner template")
}

pub struct TerminalSink {
    bar: Mutex<Option<ProgressBar>>,
    is_tty: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    fn println(&self, line: String) {
        let guard = self.bar.lock().ok();
        match guard.as_ref().and_then(|bar| bar.as_ref()) {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ => eprintln!("{line}"),
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut guard| guard.take())
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalSink {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Note(message) => self.println(format!("note: {message}")),
            ProgressEvent::Warning(message) => self.println(format!("warning: {message}")),
            ProgressEvent::Started { url, destination } => {
                eprintln!("downloading {url}");
                let bar = if self.is_tty {
                    ProgressBar::new_spinner()
                } else {
                    ProgressBar::hidden()
                };
                bar.set_style(pending_style());
                let name = destination
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                bar.set_message(name);
                if let Ok(mut guard) = self.bar.lock() {
                    *guard = Some(bar);
                }
            }
            ProgressEvent::Progress(update) => {
                if let Ok(guard) = self.bar.lock() {
                    if let Some(bar) = guard.as_ref() {
                        if let Some(total) = update.total {
                            if bar.length() != Some(total) {
                                bar.set_length(total);
                                bar.set_style(bar_style());
                            }
                        }
                        bar.set_position(update.transferred);
                    }
                }
            }
            ProgressEvent::Completed { path, .. } => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                eprintln!("saved {}", path.display());
            }
            ProgressEvent::Failed { message } => {
                if let Some(bar) = self.take_bar() {
                    bar.abandon();
                }
                eprintln!("error: {message}");
            }
        }
    }
}
