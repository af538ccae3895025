// Core types for the inventory verification workflow

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The three inventory-count sites tracked by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    FrcNorthIsland,
    FrcEast,
    FrcSoutheast,
}

impl Location {
    /// All locations in form order
    pub const ALL: [Location; 3] = [
        Location::FrcNorthIsland,
        Location::FrcEast,
        Location::FrcSoutheast,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Location::FrcNorthIsland => "FRC North Island",
            Location::FrcEast => "FRC East",
            Location::FrcSoutheast => "FRC Southeast",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Location::FrcNorthIsland => 0,
            Location::FrcEast => 1,
            Location::FrcSoutheast => 2,
        }
    }

    /// Parse a location from its display name or a short key
    /// (`north-island`, `east`, `southeast`)
    pub fn parse(input: &str) -> Option<Location> {
        let normalized = input.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "frc-north-island" | "north-island" | "northisland" => Some(Location::FrcNorthIsland),
            "frc-east" | "east" => Some(Location::FrcEast),
            "frc-southeast" | "southeast" => Some(Location::FrcSoutheast),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Verification status of a single location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    #[default]
    Pending,
    Verified,
    Discrepancy,
}

impl LocationStatus {
    /// Label shown next to the location in the host UI
    pub fn label(&self) -> &'static str {
        match self {
            LocationStatus::Pending => "Pending",
            LocationStatus::Verified => "Verified",
            LocationStatus::Discrepancy => "Discrepancy",
        }
    }
}

/// Physical count input and derived status for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub location: Location,
    /// Trimmed physical count as last entered
    pub count: String,
    pub status: LocationStatus,
}

impl LocationRecord {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            count: String::new(),
            status: LocationStatus::Pending,
        }
    }

    pub fn has_count(&self) -> bool {
        !self.count.is_empty()
    }
}

/// A staged photo-evidence file
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Assigned when staged; names may repeat, ids do not
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    /// Raw payload, only used to render previews
    #[serde(skip)]
    pub content: Bytes,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// The two committable actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Verify,
    Discrepancy,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Verify => f.write_str("verify"),
            ActionKind::Discrepancy => f.write_str("discrepancy"),
        }
    }
}

/// Externally visible phase of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowPhase {
    Editing,
    AwaitingConfirmation(ActionKind),
    Submitting(ActionKind),
    Verified,
    DiscrepancyReported,
}

impl WorkflowPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Verified | WorkflowPhase::DiscrepancyReported)
    }
}

/// Immutable capture of the form handed to submission
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub correlation_id: String,
    pub action: ActionKind,
    pub locations: Vec<LocationRecord>,
    pub notes: Option<String>,
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Locations whose recorded count is non-empty
    pub fn counted_locations(&self) -> impl Iterator<Item = &LocationRecord> {
        self.locations.iter().filter(|r| r.has_count())
    }
}

/// Hint for a single count field after a validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldHint {
    Valid,
    Missing,
}

/// Hint for the notes field; notes never block submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotesHint {
    Provided,
    Recommended,
}

/// Result of the last full form validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub fields: [(Location, FieldHint); 3],
    pub notes: NotesHint,
    pub can_verify: bool,
    pub can_report: bool,
}

impl Default for FormValidation {
    fn default() -> Self {
        Self {
            fields: Location::ALL.map(|l| (l, FieldHint::Missing)),
            notes: NotesHint::Recommended,
            can_verify: false,
            can_report: true,
        }
    }
}
