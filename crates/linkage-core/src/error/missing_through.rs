use super::Error;

/// Error when a many-to-many association is declared without naming the
/// junction it goes through. No junction name is ever derived automatically.
#[derive(Debug)]
pub(super) struct MissingThroughError {
    subject: Box<str>,
}

impl std::error::Error for MissingThroughError {}

impl core::fmt::Display for MissingThroughError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{}: many-to-many associations require a `through` junction",
            self.subject
        )
    }
}

impl Error {
    /// Creates a missing-through error for the declaration described by `subject`.
    pub fn missing_through(subject: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MissingThrough(MissingThroughError {
            subject: subject.into().into(),
        }))
    }

    /// Returns `true` if this error is a missing-through error.
    pub fn is_missing_through(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::MissingThrough(_)))
    }
}
