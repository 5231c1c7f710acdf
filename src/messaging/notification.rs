// Change notifications emitted by the editing session

use crate::model::{NodeId, ParameterId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Structural property of a module that an edit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    Name,
    Description,
    Type,
    Children,
    Disabled,
    MetaModule,
}

/// What changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A command (or grouped command) was committed to the history
    CommandExecuted { description: String },
    Undone { description: String },
    Redone { description: String },
    PropertyChanged { node: NodeId, property: NodeProperty },
    ParameterChanged { parameter: ParameterId },
    /// Group list, a group name, value or membership changed
    LinkedParametersChanged,
    Saved,
}

impl ChangeEvent {
    /// Events that close one undo/redo/run_command call
    pub fn is_commit(&self) -> bool {
        matches!(
            self,
            ChangeEvent::CommandExecuted { .. }
                | ChangeEvent::Undone { .. }
                | ChangeEvent::Redone { .. }
        )
    }
}

/// Change event with sequence number and timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    /// Monotonic per session
    pub sequence: u64,
    pub event: ChangeEvent,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl Notification {
    pub fn new(sequence: u64, event: ChangeEvent) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            sequence,
            event,
            timestamp,
        }
    }

    /// Whether the notification is newer than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        now.saturating_sub(self.timestamp) < max_age_ms
    }
}
