//! What to do when one part of a message cannot be built.

use std::fmt;

/// Handling of parts that fail conversion or validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailurePolicy {
    /// Drop the part, report it and keep going.
    #[default]
    BestEffort,
    /// Fail the whole message.
    Strict,
}

impl FailurePolicy {
    /// Returns true if a bad part should abort the message.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Part that was left out of a message, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPart {
    /// Name of the part.
    pub name: String,
    /// Why it was dropped.
    pub reason: String,
}

impl DroppedPart {
    /// Creates a record of a dropped part.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DroppedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}
