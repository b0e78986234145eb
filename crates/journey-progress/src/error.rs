//! Storage errors shared by the progress ledger and form stores

/// Failure talking to a remote store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or timed out
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Caller not allowed to read or write the rows
    #[error("permission denied on '{0}'")]
    PermissionDenied(String),

    /// Update targeted a row that does not exist
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// Store rejected the payload
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl StoreError {
    /// Whether repeating the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Unavailable("timeout".into()).is_transient());
        assert!(!StoreError::PermissionDenied("core_objectives".into()).is_transient());
        assert!(!StoreError::InvalidPayload("bad".into()).is_transient());
    }

    #[test]
    fn display() {
        let err = StoreError::PermissionDenied("vision_statements".into());
        assert_eq!(err.to_string(), "permission denied on 'vision_statements'");
    }
}
