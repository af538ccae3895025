// Inventory Verify Library - Physical Inventory Verification Workflow
// This exposes the core components for testing and integration

pub mod verification;
pub mod telemetry;
pub mod observability;
pub mod config;

// Re-export key types for easy access
pub use verification::{
    ActionKind, Location, LocationStatus, PendingFile, RejectReason, SignalLog, SignalSink,
    SubmissionResult, SubmissionSink, VerificationWorkflow, WorkflowError, WorkflowPhase,
};
pub use telemetry::{init_telemetry, shutdown_telemetry, generate_correlation_id};
pub use observability::{create_workflow_span, OperationTimer};
pub use self::config::InventoryVerifyConfig;
