// Inventory Verification Module - Confirmable Two-Outcome Workflow
//
// Per-location count validation, photo-evidence staging and the
// verify / report-discrepancy submission flow, driven by a statig
// state machine with the submission sink injected for testing.

pub mod types;
pub mod errors;
pub mod traits;
pub mod signals;
pub mod attachments;
pub mod preview;
pub mod state_machine;
pub mod submission;
pub mod workflow;

#[cfg(test)]
pub mod mocks;


pub use attachments::{AttachmentPolicy, PendingFile};
pub use errors::{RejectReason, SubmissionError, WorkflowError};
pub use signals::{ConfirmationPrompt, Notification, Severity, Signal, SignalLog, StatusBanner, TracingSignals};
pub use submission::{RetryPolicy, SimulatedSubmission};
pub use traits::{SignalSink, SubmissionReceipt, SubmissionSink};
pub use types::{ActionKind, Attachment, FormValidation, Location, LocationRecord, LocationStatus, Snapshot, WorkflowPhase};
pub use workflow::{SubmissionResult, VerificationWorkflow};
