// Mock submission sinks for testing - no delays, scripted outcomes

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::errors::SubmissionError;
use super::traits::{SubmissionReceipt, SubmissionSink};
use super::types::Snapshot;

/// Replays a script of outcomes, one per call; succeeds once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedSubmission {
    script: Mutex<VecDeque<Result<(), SubmissionError>>>,
    submitted: Mutex<Vec<Snapshot>>,
}

impl ScriptedSubmission {
    pub fn new(script: Vec<Result<(), SubmissionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<Snapshot> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionSink for ScriptedSubmission {
    async fn submit(&self, snapshot: &Snapshot) -> Result<SubmissionReceipt, SubmissionError> {
        self.submitted.lock().unwrap().push(snapshot.clone());
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        next.map(|()| SubmissionReceipt {
            reference: format!("mock-{}", self.calls()),
            accepted_at: Utc::now(),
            message: None,
        })
    }
}
