//! Error taxonomy shared by the store, the lifecycle manager and the views

use thiserror::Error;

/// Errors surfaced by relationship operations
///
/// Every store implementation maps its internal failures onto these variants
/// so that callers can branch on the kind without knowing the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationshipError {
    /// A pending or accepted relationship already exists for the pair
    #[error("A relationship already exists between these users")]
    AlreadyExists,

    /// The acting user may not perform this transition
    #[error("Not authorized to modify this relationship")]
    NotAuthorized,

    /// The edge (or a referenced profile) does not exist
    #[error("Relationship not found")]
    NotFound,

    /// The backing store failed or could not be reached
    #[error("Relationship store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed ids, self-relationships or corrupt persisted data
    #[error("Invalid relationship data: {0}")]
    Invalid(String),
}

/// Payload-free discriminant of [`RelationshipError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// See [`RelationshipError::AlreadyExists`]
    AlreadyExists,
    /// See [`RelationshipError::NotAuthorized`]
    NotAuthorized,
    /// See [`RelationshipError::NotFound`]
    NotFound,
    /// See [`RelationshipError::StoreUnavailable`]
    StoreUnavailable,
    /// See [`RelationshipError::Invalid`]
    Invalid,
}

impl RelationshipError {
    /// The kind of this error, for metrics and branching
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationshipError::AlreadyExists => ErrorKind::AlreadyExists,
            RelationshipError::NotAuthorized => ErrorKind::NotAuthorized,
            RelationshipError::NotFound => ErrorKind::NotFound,
            RelationshipError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            RelationshipError::Invalid(_) => ErrorKind::Invalid,
        }
    }
}

impl ErrorKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotAuthorized => "not_authorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Invalid => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(RelationshipError::AlreadyExists.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            RelationshipError::StoreUnavailable("down".into()).kind(),
            ErrorKind::StoreUnavailable
        );
        assert_eq!(ErrorKind::NotAuthorized.as_str(), "not_authorized");
    }

    #[test]
    fn test_display_carries_detail() {
        let err = RelationshipError::StoreUnavailable("connection reset".into());
        assert!(err.to_string().contains("connection reset"));
    }
}
