// Public operations of the verification workflow. Every mutation goes
// through the state machine; this layer adds validation results,
// submission and preview handling on top.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use super::attachments::{AttachmentPolicy, PendingFile};
use super::errors::{SubmissionError, WorkflowError};
use super::preview::{Preview, PreviewRenderer};
use super::signals::{ConfirmationPrompt, Notification, Severity, Signal, StatusBanner};
use super::state_machine::{WorkflowEvent, WorkflowMachine};
use super::submission::{RetryPolicy, SimulatedSubmission};
use super::traits::{SignalSink, SubmissionReceipt, SubmissionSink};
use super::types::{
    ActionKind, Attachment, FormValidation, Location, LocationRecord, LocationStatus, Snapshot,
    WorkflowPhase,
};
use crate::config::InventoryVerifyConfig;
use crate::observability::{create_workflow_span, OperationTimer};
use crate::telemetry::generate_correlation_id;

/// Outcome of `confirm_action`
#[derive(Debug, Clone)]
pub enum SubmissionResult {
    /// No action was awaiting confirmation; nothing happened
    NothingPending,
    Completed {
        phase: WorkflowPhase,
        snapshot: Snapshot,
        receipt: SubmissionReceipt,
    },
    /// Submission gave up; the form is editable again and unchanged
    Failed {
        action: ActionKind,
        error: SubmissionError,
    },
}

impl SubmissionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmissionResult::Completed { .. })
    }
}

pub struct VerificationWorkflow {
    machine: WorkflowMachine,
    policy: AttachmentPolicy,
    retry: RetryPolicy,
    sink: Arc<dyn SubmissionSink>,
    signals: Arc<dyn SignalSink>,
    renderer: PreviewRenderer,
    previews: Vec<Preview>,
}

impl VerificationWorkflow {
    pub fn new(sink: Arc<dyn SubmissionSink>, signals: Arc<dyn SignalSink>) -> Self {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Verification workflow started");

        let workflow = Self {
            machine: WorkflowMachine::new(correlation_id),
            policy: AttachmentPolicy::default(),
            retry: RetryPolicy::default(),
            sink,
            signals,
            renderer: PreviewRenderer::new(),
            previews: Vec::new(),
        };
        workflow.signals.emit(&Signal::Banner(StatusBanner::pending()));
        workflow
    }

    /// Build a workflow with the simulated sink and limits from configuration
    pub fn from_config(config: &InventoryVerifyConfig, signals: Arc<dyn SignalSink>) -> Self {
        let sink = Arc::new(SimulatedSubmission::from_config(&config.submission));
        Self::new(sink, signals)
            .with_attachment_policy(AttachmentPolicy::from_config(&config.attachments))
            .with_retry_policy(RetryPolicy::from_config(&config.submission))
    }

    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn dispatch(&mut self, event: WorkflowEvent) {
        for signal in self.machine.dispatch(&event) {
            self.signals.emit(&signal);
        }
    }

    fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.signals
            .emit(&Signal::Notification(Notification::new(message, severity)));
    }

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        match self.machine.phase() {
            WorkflowPhase::Editing => Ok(()),
            WorkflowPhase::AwaitingConfirmation(pending) => {
                Err(WorkflowError::ConfirmationPending { pending })
            }
            _ => Err(WorkflowError::Frozen),
        }
    }

    /// Record a physical count; an empty (after trim) value resets the location to pending
    pub fn set_location_count(&mut self, location: Location, raw: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.dispatch(WorkflowEvent::SetLocationCount {
            location,
            value: raw.to_string(),
        });
        Ok(())
    }

    pub fn set_notes(&mut self, raw: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.dispatch(WorkflowEvent::SetNotes {
            value: raw.to_string(),
        });
        Ok(())
    }

    /// Validate and stage a file, then start rendering its preview
    pub fn add_attachment(&mut self, file: PendingFile) -> Result<Attachment, WorkflowError> {
        self.ensure_editable()?;

        let name = file.name.clone();
        let attachment = match self.policy.admit(file) {
            Ok(attachment) => attachment,
            Err(reason) => {
                warn!(
                    correlation_id = %self.correlation_id(),
                    name = %name,
                    reason = ?reason,
                    max_size_bytes = self.policy.max_size_bytes(),
                    "Attachment rejected"
                );
                self.notify(reason.message(), Severity::Error);
                return Err(WorkflowError::AttachmentRejected { name, reason });
            }
        };

        self.dispatch(WorkflowEvent::StageAttachment(attachment.clone()));
        self.renderer.spawn(attachment.clone());
        Ok(attachment)
    }

    /// Remove the first staged attachment with this name; no-op if absent
    pub fn remove_attachment(&mut self, name: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        let id = match self.attachments().iter().find(|a| a.name == name) {
            Some(attachment) => attachment.id,
            None => {
                debug!(correlation_id = %self.correlation_id(), name = %name, "No staged attachment to remove");
                return Ok(());
            }
        };
        self.dispatch(WorkflowEvent::RemoveAttachment { id });
        self.previews.retain(|p| p.attachment_id != id);
        Ok(())
    }

    /// True iff every location has a physical count
    pub fn is_submittable(&self) -> bool {
        self.machine.state().is_submittable()
    }

    /// Stage an action for confirmation. Verify is gated on `is_submittable`;
    /// discrepancy reports are not.
    pub fn request_action(&mut self, action: ActionKind) -> Result<ConfirmationPrompt, WorkflowError> {
        self.ensure_editable()?;
        if action == ActionKind::Verify && !self.is_submittable() {
            return Err(WorkflowError::NotSubmittable);
        }

        let prompt = self.machine.state().confirmation_prompt(action);
        self.dispatch(WorkflowEvent::RequestAction(action));
        Ok(prompt)
    }

    /// Drop the pending action without any other effect
    pub fn cancel_action(&mut self) {
        self.dispatch(WorkflowEvent::CancelAction);
    }

    /// Submit the pending action. Runs to completion once started.
    ///
    /// Dropping the returned future before it resolves (for example under
    /// `tokio::time::timeout`) leaves the workflow in `Submitting`: edits
    /// return `WorkflowError::Frozen`, `is_terminal` stays false, and a
    /// later `confirm_action` returns `NothingPending`.
    pub async fn confirm_action(&mut self) -> SubmissionResult {
        if !matches!(self.machine.phase(), WorkflowPhase::AwaitingConfirmation(_)) {
            debug!(
                correlation_id = %self.correlation_id(),
                phase = ?self.machine.phase(),
                "Confirm without a pending action ignored"
            );
            return SubmissionResult::NothingPending;
        }

        self.dispatch(WorkflowEvent::BeginSubmission {
            timestamp: Utc::now(),
        });
        let snapshot = match self.machine.state().in_flight() {
            Some(snapshot) => snapshot.clone(),
            None => return SubmissionResult::NothingPending,
        };

        let span = create_workflow_span("submit_verification", &snapshot.correlation_id);
        let timer = OperationTimer::new(&format!("submit_{}", snapshot.action));
        let result = self
            .retry
            .submit(self.sink.as_ref(), &snapshot)
            .instrument(span)
            .await;
        timer.finish();

        match result {
            Ok(receipt) => {
                self.dispatch(WorkflowEvent::SubmissionSucceeded);
                if let Some(message) = &receipt.message {
                    self.notify(message.clone(), Severity::Info);
                }
                info!(
                    correlation_id = %snapshot.correlation_id,
                    action = %snapshot.action,
                    reference = %receipt.reference,
                    "Verification submitted"
                );
                SubmissionResult::Completed {
                    phase: self.machine.phase(),
                    snapshot,
                    receipt,
                }
            }
            Err(error) => {
                self.dispatch(WorkflowEvent::SubmissionFailed {
                    reason: error.to_string(),
                });
                SubmissionResult::Failed {
                    action: snapshot.action,
                    error,
                }
            }
        }
    }

    /// Apply previews that finished rendering, in completion order
    pub fn poll_previews(&mut self) -> &[Preview] {
        let ready = self.renderer.drain_ready();
        self.accept_previews(ready);
        &self.previews
    }

    /// Wait for every outstanding render, then apply them
    pub async fn wait_for_previews(&mut self) -> &[Preview] {
        let ready = self.renderer.drain_all().await;
        self.accept_previews(ready);
        &self.previews
    }

    fn accept_previews(&mut self, ready: Vec<Preview>) {
        for preview in ready {
            let staged = self
                .machine
                .state()
                .attachments()
                .iter()
                .any(|a| a.id == preview.attachment_id);
            if staged {
                self.previews.push(preview);
            } else {
                debug!(
                    name = %preview.attachment_name,
                    id = %preview.attachment_id,
                    "Dropping preview of removed attachment"
                );
            }
        }
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.machine.phase()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn location_status(&self, location: Location) -> LocationStatus {
        self.machine.state().location(location).status
    }

    pub fn locations(&self) -> &[LocationRecord] {
        self.machine.state().locations()
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.machine.state().attachments()
    }

    pub fn notes(&self) -> &str {
        self.machine.state().notes()
    }

    pub fn pending_action(&self) -> Option<ActionKind> {
        self.machine.state().pending_action()
    }

    pub fn validation(&self) -> &FormValidation {
        self.machine.state().validation()
    }

    pub fn correlation_id(&self) -> &str {
        self.machine.state().correlation_id()
    }
}

impl std::fmt::Debug for VerificationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationWorkflow")
            .field("machine", &self.machine)
            .field("policy", &self.policy)
            .field("retry", &self.retry)
            .field("previews", &self.previews.len())
            .finish()
    }
}
