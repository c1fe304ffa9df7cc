//! Error types shared by the timeline engine and its store adapters.

use thiserror::Error;

/// Errors surfaced at the asynchronous boundaries of the timeline.
///
/// None of these are fatal: callers degrade to an empty state, default
/// preferences, or the last known in-memory lists.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The bookmark tree (or a node lookup) could not be read.
    #[error("Bookmark store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store refused or failed to delete a bookmark.
    #[error("Failed to delete bookmark {id}: {reason}")]
    DeleteFailed { id: String, reason: String },

    /// A node with the given ID does not exist.
    #[error("Bookmark not found: {0}")]
    NotFound(String),

    /// The settings store could not be read or written.
    #[error("Settings store error: {0}")]
    Settings(String),

    /// The pacing step before a page merge was interrupted.
    #[error("Page load interrupted: {0}")]
    Pacing(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Opening a URL in a tab failed.
    #[error("Failed to open {url}: {reason}")]
    Launch { url: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TimelineError::DeleteFailed {
            id: "42".to_string(),
            reason: "locked".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to delete bookmark 42: locked");
        assert_eq!(
            TimelineError::NotFound("7".to_string()).to_string(),
            "Bookmark not found: 7"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: TimelineError = parse.unwrap_err().into();
        assert!(matches!(err, TimelineError::Json(_)));
    }
}
