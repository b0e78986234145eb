//! Progress ledger records
//!
//! One [`ProgressRecord`] per (user, step). Records are created lazily when a
//! step becomes reachable and are never deleted.

use chrono::{DateTime, Utc};
use journey_registry::{StepDescriptor, StepId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the journey owner, supplied by the session layer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ledger row, serialized with the ledger's column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Owner
    pub user_id: UserId,
    /// Step
    #[serde(rename = "step_number")]
    pub step_id: StepId,
    /// Step display name at the time of writing
    #[serde(default)]
    pub step_name: String,
    /// Step submitted
    #[serde(default)]
    pub completed: bool,
    /// Step reachable
    #[serde(default)]
    pub available: bool,
    /// First completion time
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Record that makes a step reachable
    #[must_use]
    pub fn unlocked(user: &UserId, step: &StepDescriptor) -> Self {
        Self {
            user_id: user.clone(),
            step_id: step.id,
            step_name: step.title.clone(),
            completed: false,
            available: true,
            completed_at: None,
        }
    }

    /// Record that marks a step submitted at `at`
    #[must_use]
    pub fn completed(user: &UserId, step: &StepDescriptor, at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.clone(),
            step_id: step.id,
            step_name: step.title.clone(),
            completed: true,
            available: true,
            completed_at: Some(at),
        }
    }

    /// Reachable but not yet submitted
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.available && !self.completed
    }

    /// Upsert semantics: fold `incoming` into `self`
    ///
    /// `completed` and `available` never revert to false, and an existing
    /// `completed_at` is kept, so applying the same upsert twice (or an older
    /// one after a newer one) leaves the record unchanged.
    #[must_use]
    pub fn merge(&self, incoming: &ProgressRecord) -> ProgressRecord {
        let completed = self.completed || incoming.completed;
        let completed_at = if completed {
            self.completed_at.or(incoming.completed_at)
        } else {
            None
        };
        let step_name = if incoming.step_name.is_empty() {
            self.step_name.clone()
        } else {
            incoming.step_name.clone()
        };

        ProgressRecord {
            user_id: self.user_id.clone(),
            step_id: self.step_id,
            step_name,
            completed,
            available: self.available || incoming.available,
            completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn descriptor() -> StepDescriptor {
        StepDescriptor::new(StepId(12), "Core Objectives", "core_objectives")
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn unlocked_is_pending() {
        let r = ProgressRecord::unlocked(&UserId::new("u1"), &descriptor());
        assert!(r.is_pending());
        assert_eq!(r.step_name, "Core Objectives");
        assert!(r.completed_at.is_none());
    }

    #[test]
    fn merge_is_idempotent() {
        let user = UserId::new("u1");
        let done = ProgressRecord::completed(&user, &descriptor(), at(9));
        assert_eq!(done.merge(&done), done);
    }

    #[test]
    fn merge_never_regresses_completion() {
        let user = UserId::new("u1");
        let done = ProgressRecord::completed(&user, &descriptor(), at(9));
        let unlock = ProgressRecord::unlocked(&user, &descriptor());

        let merged = done.merge(&unlock);
        assert!(merged.completed);
        assert_eq!(merged.completed_at, Some(at(9)));
    }

    #[test]
    fn merge_keeps_first_completion_time() {
        let user = UserId::new("u1");
        let first = ProgressRecord::completed(&user, &descriptor(), at(9));
        let retry = ProgressRecord::completed(&user, &descriptor(), at(11));
        let stale = ProgressRecord::completed(&user, &descriptor(), at(7));

        assert_eq!(first.merge(&retry).completed_at, Some(at(9)));
        assert_eq!(first.merge(&stale).completed_at, Some(at(9)));
    }

    #[test]
    fn merge_completes_pending_record() {
        let user = UserId::new("u1");
        let pending = ProgressRecord::unlocked(&user, &descriptor());
        let done = ProgressRecord::completed(&user, &descriptor(), at(10));

        let merged = pending.merge(&done);
        assert!(merged.completed);
        assert!(merged.available);
        assert_eq!(merged.completed_at, Some(at(10)));
    }

    #[test]
    fn serializes_with_ledger_column_names() {
        let r = ProgressRecord::unlocked(&UserId::new("u1"), &descriptor());
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["step_number"], 12);
        assert_eq!(json["step_name"], "Core Objectives");
        assert_eq!(json["completed"], false);
        assert_eq!(json["available"], true);
        assert!(json["completed_at"].is_null());
    }

    #[test]
    fn deserializes_sparse_legacy_row() {
        let r: ProgressRecord =
            serde_json::from_str(r#"{"user_id": "u1", "step_number": 3}"#).unwrap();
        assert!(!r.completed);
        assert!(!r.available);
        assert!(r.step_name.is_empty());
    }
}
