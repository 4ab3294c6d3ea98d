//! Progress reporting for sync jobs.
//!
//! Jobs push [`ProgressEvent`]s into an unbounded channel; whoever holds the
//! receiver (CLI printer, SSE bridge, test) decides what to do with them.
//! Severity is advisory only and never drives control flow inside a job.
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    /// Reconciliation inserted a stat row for a competition not seen before.
    StatNew,
    /// Reconciliation overwrote a stat row that disagreed with the provider.
    StatUpdated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Log { message: String, severity: Severity },
    Scouting { total: usize, years: Vec<i32> },
    Fetching { year: i32, current: usize, total: usize },
}

impl ProgressEvent {
    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressEvent::Log { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            ProgressEvent::Log { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}

/// Cheap cloneable handle for emitting progress. A reporter without a channel
/// still mirrors every log line to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening anymore; the job keeps going.
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!(target: "progress", "{}", message),
            Severity::Warning => tracing::warn!(target: "progress", "{}", message),
            _ => tracing::info!(target: "progress", ?severity, "{}", message),
        }
        self.emit(ProgressEvent::Log { message, severity });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(Severity::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }
}

/// Drain everything currently buffered in the receiver.
pub fn drain(rx: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
