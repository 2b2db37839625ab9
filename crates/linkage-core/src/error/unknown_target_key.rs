use super::Error;

/// Error when a foreign key would reference an attribute the referenced
/// entity does not have, including the case of an entity without a primary
/// key when no explicit key was given.
#[derive(Debug)]
pub(super) struct UnknownTargetKeyError {
    subject: Box<str>,
    entity: Box<str>,
    key: Box<str>,
}

impl std::error::Error for UnknownTargetKeyError {}

impl core::fmt::Display for UnknownTargetKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{}: entity `{}` has no attribute `{}` to reference",
            self.subject, self.entity, self.key
        )
    }
}

impl Error {
    pub fn unknown_target_key(
        subject: impl Into<String>,
        entity: impl Into<String>,
        key: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnknownTargetKey(UnknownTargetKeyError {
            subject: subject.into().into(),
            entity: entity.into().into(),
            key: key.into().into(),
        }))
    }

    pub fn is_unknown_target_key(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnknownTargetKey(_)))
    }
}
