//! Error taxonomy for mood detection and playlist generation.
//!
//! Classification and playlist building return [`MoodError`] so callers can
//! tell "nothing to analyze" apart from "the catalog is down". Application
//! plumbing (database, config files, CLI) keeps using `anyhow`.

use thiserror::Error;

/// Errors surfaced by the mood engine.
#[derive(Debug, Error)]
pub enum MoodError {
    /// No text was supplied, or it was only whitespace.
    #[error("Text input is required for mood analysis")]
    EmptyInput,

    /// The expression model found no face in the frame.
    #[error("No face detected in the image")]
    NoFaceDetected,

    /// The music catalog could not be reached, timed out, or rejected the call.
    #[error("Music catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),

    /// A playlist request failed input-shape validation.
    #[error("Invalid playlist request: {0}")]
    InvalidRequest(String),

    /// The request was cancelled before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

/// Failures reported by a [`Catalog`](crate::catalog::Catalog) implementation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog call timed out after {0} ms")]
    Timeout(u64),

    #[error("catalog transport error: {0}")]
    Transport(String),

    #[error("catalog rejected credentials: {0}")]
    Unauthorized(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Self::Transport(format!("catalog database busy: {err}"))
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

pub type MoodResult<T> = std::result::Result<T, MoodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_converts_into_unavailable() {
        let err: MoodError = CatalogError::Timeout(5000).into();
        assert!(matches!(err, MoodError::CatalogUnavailable(CatalogError::Timeout(5000))));
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn test_error_messages_name_the_reason() {
        assert_eq!(
            MoodError::EmptyInput.to_string(),
            "Text input is required for mood analysis"
        );
        assert_eq!(MoodError::NoFaceDetected.to_string(), "No face detected in the image");
        assert!(MoodError::InvalidRequest("limit must be positive".into())
            .to_string()
            .contains("limit must be positive"));
    }
}
