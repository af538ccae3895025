use thiserror::Error;

use super::types::ActionKind;

/// Why a file was refused before staging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidType,
    TooLarge,
}

impl RejectReason {
    /// User-facing message shown in the rejection notification
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidType => {
                "Invalid file type. Please upload JPG, PNG, or GIF images."
            }
            RejectReason::TooLarge => "File too large. Maximum size is 10MB.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Attachment {name} rejected: {}", .reason.message())]
    AttachmentRejected { name: String, reason: RejectReason },
    #[error("Workflow is frozen; no further edits are accepted")]
    Frozen,
    #[error("A {pending} action is awaiting confirmation")]
    ConfirmationPending { pending: ActionKind },
    #[error("All locations must have a physical count before marking verified")]
    NotSubmittable,
}

impl WorkflowError {
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            WorkflowError::AttachmentRejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Failure reported by a submission sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Submission timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Submission rejected: {reason}")]
    Rejected { reason: String },
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SubmissionError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SubmissionError::Rejected { .. })
    }
}
