// Seams between the workflow and its host

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::SubmissionError;
use super::signals::Signal;
use super::types::Snapshot;

/// Acknowledgement returned by a sink once a snapshot is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub reference: String,
    pub accepted_at: DateTime<Utc>,
    /// Follow-up message for the user, e.g. where the records went
    pub message: Option<String>,
}

/// Destination for confirmed snapshots
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, snapshot: &Snapshot) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Receives status labels, banners, notifications and prompts
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: &Signal);
}
