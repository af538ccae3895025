use std::time::Instant;
use tracing::info;

/// Create correlated spans for verification workflows
pub fn create_workflow_span(workflow: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        workflow.name = workflow,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
