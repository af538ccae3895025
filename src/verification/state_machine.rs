use chrono::{DateTime, Utc};
use statig::prelude::*;
use uuid::Uuid;

use super::signals::{ConfirmationPrompt, Notification, Severity, Signal, StatusBanner};
use super::types::{
    ActionKind, Attachment, FieldHint, FormValidation, Location, LocationRecord, LocationStatus,
    NotesHint, Snapshot, WorkflowPhase,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    SetLocationCount { location: Location, value: String },
    SetNotes { value: String },
    StageAttachment(Attachment),
    RemoveAttachment { id: Uuid },
    RequestAction(ActionKind),
    CancelAction,
    BeginSubmission { timestamp: DateTime<Utc> },
    SubmissionSucceeded,
    SubmissionFailed { reason: String },
}

/// Shared storage of the verification state machine
#[derive(Debug)]
pub struct WorkflowState {
    correlation_id: String,
    locations: [LocationRecord; 3],
    attachments: Vec<Attachment>,
    notes: String,
    pending_action: Option<ActionKind>,
    in_flight: Option<Snapshot>,
    validation: FormValidation,
    terminal: bool,
}

impl WorkflowState {
    pub fn new(correlation_id: String) -> Self {
        let mut state = Self {
            correlation_id,
            locations: Location::ALL.map(LocationRecord::new),
            attachments: Vec::new(),
            notes: String::new(),
            pending_action: None,
            in_flight: None,
            validation: FormValidation::default(),
            terminal: false,
        };
        state.revalidate();
        state
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn locations(&self) -> &[LocationRecord] {
        &self.locations
    }

    pub fn location(&self, location: Location) -> &LocationRecord {
        &self.locations[location.index()]
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn pending_action(&self) -> Option<ActionKind> {
        self.pending_action
    }

    pub fn in_flight(&self) -> Option<&Snapshot> {
        self.in_flight.as_ref()
    }

    pub fn validation(&self) -> &FormValidation {
        &self.validation
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_submittable(&self) -> bool {
        self.locations
            .iter()
            .all(|r| r.status == LocationStatus::Verified)
    }

    fn apply_count(&mut self, context: &mut Vec<Signal>, location: Location, value: &str) {
        let record = &mut self.locations[location.index()];
        record.count = value.trim().to_string();
        record.status = if record.has_count() {
            LocationStatus::Verified
        } else {
            LocationStatus::Pending
        };

        context.push(Signal::LocationStatus {
            location,
            status: record.status,
        });
        self.revalidate();
    }

    /// Full form validation pass; recomputes every hint and both gates
    fn revalidate(&mut self) {
        let fields = self.locations.clone().map(|r| {
            let hint = if r.has_count() {
                FieldHint::Valid
            } else {
                FieldHint::Missing
            };
            (r.location, hint)
        });
        let notes = if self.notes.is_empty() {
            NotesHint::Recommended
        } else {
            NotesHint::Provided
        };

        self.validation = FormValidation {
            fields,
            notes,
            can_verify: self.is_submittable(),
            can_report: true,
        };

        tracing::trace!(
            correlation_id = %self.correlation_id,
            can_verify = self.validation.can_verify,
            "Form revalidated"
        );
    }

    pub(crate) fn confirmation_prompt(&self, action: ActionKind) -> ConfirmationPrompt {
        match action {
            ActionKind::Verify => {
                let names: Vec<&str> = self
                    .locations
                    .iter()
                    .map(|r| r.location.display_name())
                    .collect();
                let counts: Vec<String> = self
                    .locations
                    .iter()
                    .map(|r| format!("{} ({})", r.count, r.location))
                    .collect();
                let mut message = format!(
                    "Are you sure you want to mark {} as verified? This will confirm physical counts of {}.",
                    names.join(", "),
                    counts.join(", ")
                );
                // Counts are free text; only sum them when every one is a whole number
                let total: Option<u64> = self
                    .locations
                    .iter()
                    .map(|r| r.count.trim().parse::<u64>().ok())
                    .sum();
                if let Some(total) = total {
                    message.push_str(&format!(" Total counted: {total}."));
                }
                ConfirmationPrompt {
                    action,
                    title: "Confirm Verification".to_string(),
                    message,
                }
            }
            ActionKind::Discrepancy => {
                let counts: Vec<String> = self
                    .locations
                    .iter()
                    .map(|r| {
                        if r.has_count() {
                            format!("{}: {}", r.location, r.count)
                        } else {
                            format!("{}: not counted", r.location)
                        }
                    })
                    .collect();
                ConfirmationPrompt {
                    action,
                    title: "Report Discrepancy".to_string(),
                    message: format!(
                        "Are you sure you want to report a discrepancy? Recorded counts: {}.",
                        counts.join(", ")
                    ),
                }
            }
        }
    }

    fn snapshot(&self, action: ActionKind, timestamp: DateTime<Utc>) -> Snapshot {
        Snapshot {
            correlation_id: self.correlation_id.clone(),
            action,
            locations: self.locations.to_vec(),
            notes: (!self.notes.is_empty()).then(|| self.notes.clone()),
            attachments: self.attachments.clone(),
            timestamp,
        }
    }

    fn finish(&mut self, context: &mut Vec<Signal>, action: ActionKind) {
        match action {
            ActionKind::Verify => {
                for record in self.locations.iter_mut() {
                    record.status = LocationStatus::Verified;
                }
                context.push(Signal::Banner(StatusBanner::verified()));
                context.push(Signal::Notification(Notification::new(
                    "Location verified successfully!",
                    Severity::Success,
                )));
            }
            ActionKind::Discrepancy => {
                for record in self.locations.iter_mut().filter(|r| r.has_count()) {
                    record.status = LocationStatus::Discrepancy;
                }
                context.push(Signal::Banner(StatusBanner::discrepancy()));
                context.push(Signal::Notification(Notification::new(
                    "Discrepancy reported successfully!",
                    Severity::Warning,
                )));
            }
        }

        for record in &self.locations {
            context.push(Signal::LocationStatus {
                location: record.location,
                status: record.status,
            });
        }

        self.in_flight = None;
        self.terminal = true;
        self.validation.can_verify = false;
        self.validation.can_report = false;
    }
}

#[state_machine(
    initial = "State::editing()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl WorkflowState {
    #[state]
    fn editing(&mut self, context: &mut Vec<Signal>, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::SetLocationCount { location, value } => {
                self.apply_count(context, *location, value);
                Handled
            }
            WorkflowEvent::SetNotes { value } => {
                self.notes = value.trim().to_string();
                self.revalidate();
                Handled
            }
            WorkflowEvent::StageAttachment(attachment) => {
                self.attachments.push(attachment.clone());
                tracing::info!(
                    correlation_id = %self.correlation_id,
                    name = %attachment.name,
                    size_bytes = attachment.size_bytes,
                    staged = self.attachments.len(),
                    "Attachment staged"
                );
                Handled
            }
            WorkflowEvent::RemoveAttachment { id } => {
                if let Some(pos) = self.attachments.iter().position(|a| a.id == *id) {
                    let removed = self.attachments.remove(pos);
                    tracing::info!(
                        correlation_id = %self.correlation_id,
                        name = %removed.name,
                        id = %removed.id,
                        "Attachment removed"
                    );
                }
                Handled
            }
            WorkflowEvent::RequestAction(action) => {
                if *action == ActionKind::Verify && !self.is_submittable() {
                    tracing::warn!(
                        correlation_id = %self.correlation_id,
                        "Verify requested before every location was counted"
                    );
                    return Handled;
                }
                self.pending_action = Some(*action);
                context.push(Signal::Prompt(self.confirmation_prompt(*action)));
                tracing::info!(correlation_id = %self.correlation_id, action = %action, "Action awaiting confirmation");
                Transition(State::awaiting_confirmation())
            }
            _ => Handled,
        }
    }

    #[state]
    fn awaiting_confirmation(
        &mut self,
        event: &WorkflowEvent,
    ) -> Outcome<State> {
        match event {
            WorkflowEvent::CancelAction => {
                tracing::info!(
                    correlation_id = %self.correlation_id,
                    action = ?self.pending_action,
                    "Action cancelled"
                );
                self.pending_action = None;
                Transition(State::editing())
            }
            WorkflowEvent::BeginSubmission { timestamp } => match self.pending_action.take() {
                Some(action) => {
                    self.in_flight = Some(self.snapshot(action, *timestamp));
                    tracing::info!(correlation_id = %self.correlation_id, action = %action, "Submitting snapshot");
                    Transition(State::submitting())
                }
                None => Transition(State::editing()),
            },
            _ => Handled,
        }
    }

    #[state]
    fn submitting(&mut self, context: &mut Vec<Signal>, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::SubmissionSucceeded => match self.in_flight.as_ref().map(|s| s.action) {
                Some(ActionKind::Verify) => {
                    self.finish(context, ActionKind::Verify);
                    tracing::info!(correlation_id = %self.correlation_id, "All locations verified");
                    Transition(State::verified())
                }
                Some(ActionKind::Discrepancy) => {
                    self.finish(context, ActionKind::Discrepancy);
                    tracing::info!(correlation_id = %self.correlation_id, "Discrepancy reported");
                    Transition(State::discrepancy_reported())
                }
                None => Transition(State::editing()),
            },
            WorkflowEvent::SubmissionFailed { reason } => {
                self.in_flight = None;
                context.push(Signal::Notification(Notification::new(
                    format!("Submission failed: {reason}"),
                    Severity::Error,
                )));
                tracing::error!(correlation_id = %self.correlation_id, reason = %reason, "Submission failed");
                Transition(State::editing())
            }
            _ => Handled,
        }
    }

    #[state]
    fn verified(event: &WorkflowEvent) -> Outcome<State> {
        tracing::debug!(?event, "Ignoring event after verification");
        Handled
    }

    #[state]
    fn discrepancy_reported(event: &WorkflowEvent) -> Outcome<State> {
        tracing::debug!(?event, "Ignoring event after discrepancy report");
        Handled
    }
}

/// Owns the statig machine and translates its state into a public phase
pub struct WorkflowMachine {
    machine: StateMachine<WorkflowState>,
}

impl WorkflowMachine {
    pub fn new(correlation_id: String) -> Self {
        Self {
            machine: WorkflowState::new(correlation_id).state_machine(),
        }
    }

    /// Handle one event, returning the signals it produced
    pub fn dispatch(&mut self, event: &WorkflowEvent) -> Vec<Signal> {
        let mut outbox = Vec::new();
        self.machine.handle_with_context(event, &mut outbox);
        outbox
    }

    pub fn state(&self) -> &WorkflowState {
        self.machine.inner()
    }

    pub fn phase(&self) -> WorkflowPhase {
        let inner = self.machine.inner();
        match self.machine.state() {
            State::Editing { .. } => WorkflowPhase::Editing,
            State::AwaitingConfirmation { .. } => match inner.pending_action {
                Some(action) => WorkflowPhase::AwaitingConfirmation(action),
                None => WorkflowPhase::Editing,
            },
            State::Submitting { .. } => match inner.in_flight.as_ref() {
                Some(snapshot) => WorkflowPhase::Submitting(snapshot.action),
                None => WorkflowPhase::Editing,
            },
            State::Verified { .. } => WorkflowPhase::Verified,
            State::DiscrepancyReported { .. } => WorkflowPhase::DiscrepancyReported,
        }
    }
}

impl std::fmt::Debug for WorkflowMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowMachine")
            .field("phase", &self.phase())
            .field("state", self.machine.inner())
            .finish()
    }
}
