//! Step descriptors
//!
//! A [`StepDescriptor`] is the immutable, build-time description of one
//! journey step: where it sits, where its answers live, and how they are
//! persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric step identifier
///
/// Ids run from 1 upward with gaps where legacy steps were retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub u32);

impl StepId {
    /// Raw numeric value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step-{}", self.0)
    }
}

impl From<u32> for StepId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// How a step's answers are kept in its storage table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// One live row per user; the table belongs to this step alone
    #[default]
    CurrentPerUser,
    /// One live row per (user, step); the table is shared by several steps
    CurrentPerUserStep,
    /// Every submit inserts a new row; the latest row is the current answer
    AppendOnly,
}

impl PersistenceMode {
    /// Whether submits always insert
    #[inline]
    #[must_use]
    pub fn is_append_only(self) -> bool {
        matches!(self, Self::AppendOnly)
    }

    /// Step discriminator used when reading and writing rows
    ///
    /// Only shared tables key rows by step.
    #[inline]
    #[must_use]
    pub fn row_key(self, step: StepId) -> Option<StepId> {
        match self {
            Self::CurrentPerUserStep => Some(step),
            Self::CurrentPerUser | Self::AppendOnly => None,
        }
    }
}

/// Immutable description of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Unique id
    pub id: StepId,
    /// Display name, also written to the progress ledger as `step_name`
    pub title: String,
    /// Table holding this step's answers
    pub storage_table: String,
    /// Row policy for the storage table
    #[serde(default)]
    pub persistence: PersistenceMode,
    /// Explicit predecessor; a step with several explicit successors is a gateway
    #[serde(default)]
    pub predecessor: Option<StepId>,
    /// Branch this step belongs to, if any
    #[serde(default)]
    pub branch_group: Option<String>,
}

impl StepDescriptor {
    /// Create a mainline, single-row step
    #[must_use]
    pub fn new(id: StepId, title: impl Into<String>, storage_table: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            storage_table: storage_table.into(),
            persistence: PersistenceMode::default(),
            predecessor: None,
            branch_group: None,
        }
    }

    /// With explicit predecessor
    #[inline]
    #[must_use]
    pub fn after(mut self, predecessor: StepId) -> Self {
        self.predecessor = Some(predecessor);
        self
    }

    /// Place in a branch group
    #[inline]
    #[must_use]
    pub fn in_branch(mut self, group: impl Into<String>) -> Self {
        self.branch_group = Some(group.into());
        self
    }

    /// With persistence mode
    #[inline]
    #[must_use]
    pub fn with_persistence(mut self, persistence: PersistenceMode) -> Self {
        self.persistence = persistence;
        self
    }

    /// Shorthand for [`PersistenceMode::AppendOnly`]
    #[inline]
    #[must_use]
    pub fn append_only(self) -> Self {
        self.with_persistence(PersistenceMode::AppendOnly)
    }

    /// Whether the step lives on a branch
    #[inline]
    #[must_use]
    pub fn is_branch(&self) -> bool {
        self.branch_group.is_some()
    }

    /// Whether the step continues implicitly from registry order
    #[inline]
    #[must_use]
    pub(crate) fn follows_order(&self) -> bool {
        self.predecessor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_id_display() {
        assert_eq!(StepId(12).to_string(), "step-12");
        assert_eq!(StepId::from(3u32).get(), 3);
    }

    #[test]
    fn descriptor_builder() {
        let d = StepDescriptor::new(StepId(7), "Quick Start Goals", "quick_start_goals")
            .after(StepId(6))
            .in_branch("quick-start")
            .append_only();

        assert_eq!(d.predecessor, Some(StepId(6)));
        assert!(d.is_branch());
        assert!(d.persistence.is_append_only());
        assert!(!d.follows_order());
    }

    #[test]
    fn row_key_only_for_shared_tables() {
        let step = StepId(30);
        assert_eq!(PersistenceMode::CurrentPerUser.row_key(step), None);
        assert_eq!(PersistenceMode::AppendOnly.row_key(step), None);
        assert_eq!(PersistenceMode::CurrentPerUserStep.row_key(step), Some(step));
    }

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let d: StepDescriptor = serde_json::from_str(
            r#"{"id": 4, "title": "Vision Statement", "storage_table": "vision_statements"}"#,
        )
        .unwrap();

        assert_eq!(d.id, StepId(4));
        assert_eq!(d.persistence, PersistenceMode::CurrentPerUser);
        assert!(d.predecessor.is_none());
        assert!(d.branch_group.is_none());
    }
}
