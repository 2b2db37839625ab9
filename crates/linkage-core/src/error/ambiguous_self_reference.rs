use super::Error;

/// Error when an entity is associated with itself without an alias.
#[derive(Debug)]
pub(super) struct AmbiguousSelfReferenceError {
    subject: Box<str>,
}

impl std::error::Error for AmbiguousSelfReferenceError {}

impl core::fmt::Display for AmbiguousSelfReferenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{}: self-referencing associations require an alias",
            self.subject
        )
    }
}

impl Error {
    pub fn ambiguous_self_reference(subject: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AmbiguousSelfReference(
            AmbiguousSelfReferenceError {
                subject: subject.into().into(),
            },
        ))
    }

    pub fn is_ambiguous_self_reference(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::AmbiguousSelfReference(_)))
    }
}
