use super::Error;

/// Error when a declaration collides with state already in the registry.
///
/// This occurs when:
/// - An alias is already registered for the same source/target pair with different options
/// - A foreign key name exists on the owning entity with a different type, reference or actions
/// - Two many-to-many declarations disagree on the key names of a shared junction
/// - An accessor or alias name collides with an existing attribute or association
/// - An entity name is defined twice
#[derive(Debug)]
pub(super) struct ConflictError {
    subject: Option<Box<str>>,
    message: Box<str>,
}

impl std::error::Error for ConflictError {}

impl core::fmt::Display for ConflictError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "association conflict in {}: {}", subject, self.message),
            None => write!(f, "association conflict: {}", self.message),
        }
    }
}

impl Error {
    /// Creates a conflict error for the declaration described by `subject`.
    pub fn conflict(subject: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Conflict(ConflictError {
            subject: Some(subject.into().into()),
            message: message.into().into(),
        }))
    }

    /// Creates a conflict error raised while defining an entity rather than
    /// an association.
    pub fn entity_conflict(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Conflict(ConflictError {
            subject: None,
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a conflict error.
    pub fn is_conflict(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Conflict(_)))
    }
}
