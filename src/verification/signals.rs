// Observable signals emitted to the host UI

use serde::Serialize;
use std::sync::{Arc, Mutex};

use super::traits::SignalSink;
use super::types::{ActionKind, Location, LocationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Global status banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBanner {
    pub message: String,
    pub severity: Severity,
}

impl StatusBanner {
    pub fn pending() -> Self {
        Self {
            message: "Task Pending Verification".to_string(),
            severity: Severity::Warning,
        }
    }

    pub fn verified() -> Self {
        Self {
            message: "Location Verified Successfully".to_string(),
            severity: Severity::Success,
        }
    }

    pub fn discrepancy() -> Self {
        Self {
            message: "Discrepancy Reported".to_string(),
            severity: Severity::Error,
        }
    }
}

/// Transient toast-style notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Title and body of the confirmation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationPrompt {
    pub action: ActionKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Signal {
    LocationStatus {
        location: Location,
        status: LocationStatus,
    },
    Banner(StatusBanner),
    Notification(Notification),
    Prompt(ConfirmationPrompt),
}

/// Logs every signal through tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSignals;

impl SignalSink for TracingSignals {
    fn emit(&self, signal: &Signal) {
        match signal {
            Signal::LocationStatus { location, status } => {
                tracing::debug!(location = %location, status = status.label(), "Location status");
            }
            Signal::Banner(banner) => {
                tracing::info!(severity = ?banner.severity, "{}", banner.message);
            }
            Signal::Notification(n) => match n.severity {
                Severity::Error => tracing::warn!(severity = ?n.severity, "{}", n.message),
                _ => tracing::info!(severity = ?n.severity, "{}", n.message),
            },
            Signal::Prompt(prompt) => {
                tracing::info!(action = %prompt.action, title = %prompt.title, "{}", prompt.message);
            }
        }
    }
}

/// In-memory record of emitted signals, shareable with the host
#[derive(Debug, Default, Clone)]
pub struct SignalLog {
    signals: Arc<Mutex<Vec<Signal>>>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.signals()
            .into_iter()
            .filter_map(|s| match s {
                Signal::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn last_banner(&self) -> Option<StatusBanner> {
        self.signals().into_iter().rev().find_map(|s| match s {
            Signal::Banner(b) => Some(b),
            _ => None,
        })
    }

    pub fn clear(&self) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.clear();
        }
    }
}

impl SignalSink for SignalLog {
    fn emit(&self, signal: &Signal) {
        if let Ok(mut signals) = self.signals.lock() {
            signals.push(signal.clone());
        }
    }
}
