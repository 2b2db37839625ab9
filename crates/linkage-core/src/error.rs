mod adhoc;
mod ambiguous_self_reference;
mod conflict;
mod invalid_schema;
mod missing_through;
mod unknown_target_key;

use adhoc::AdhocError;
use ambiguous_self_reference::AmbiguousSelfReferenceError;
use conflict::ConflictError;
use invalid_schema::InvalidSchemaError;
use missing_through::MissingThroughError;
use std::sync::Arc;
use unknown_target_key::UnknownTargetKeyError;

/// Builds an ad-hoc error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error raised while declaring entities and associations.
///
/// Every error is produced synchronously by the declaration that caused it.
/// The definition phase runs once before the host serves traffic, so callers
/// are expected to treat any error as fatal to startup.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => {
                    assert!(
                        inner.cause.is_none(),
                        "consequent error must not already have a cause"
                    );
                    inner.kind
                }
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Creates an ad-hoc error from format arguments. Used by [`err!`].
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if this error, or any error it wraps, matches `f`.
    fn any_kind(&self, f: impl Fn(&ErrorKind) -> bool) -> bool {
        self.chain().any(|err| f(err.kind()))
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Adhoc(AdhocError),
    Conflict(ConflictError),
    MissingThrough(MissingThroughError),
    AmbiguousSelfReference(AmbiguousSelfReferenceError),
    UnknownTargetKey(UnknownTargetKeyError),
    InvalidSchema(InvalidSchemaError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Conflict(err) => core::fmt::Display::fmt(err, f),
            MissingThrough(err) => core::fmt::Display::fmt(err, f),
            AmbiguousSelfReference(err) => core::fmt::Display::fmt(err, f),
            UnknownTargetKey(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown linkage error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // Ensure Error stays at one word (size of pointer/Arc)
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = err!("root cause");
        let chained = root
            .context(err!("middle context"))
            .context(err!("top context"));
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
    }

    #[test]
    fn kind_predicates_see_through_context() {
        let err = Error::missing_through("User.belongsToMany(Project)")
            .context(err!("while declaring `User`"));

        assert!(err.is_missing_through());
        assert!(!err.is_conflict());
        assert_eq!(
            err.to_string(),
            "while declaring `User`: User.belongsToMany(Project): many-to-many \
             associations require a `through` junction"
        );
    }

    #[test]
    fn conflict_with_and_without_subject() {
        let err = Error::conflict("Game.belongsTo(Team)", "alias `home` is already registered");
        assert_eq!(
            err.to_string(),
            "association conflict in Game.belongsTo(Team): alias `home` is already registered"
        );

        let err = Error::entity_conflict("entity `User` is already defined");
        assert_eq!(
            err.to_string(),
            "association conflict: entity `User` is already defined"
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn unknown_target_key_names_entity_and_key() {
        let err = Error::unknown_target_key("Post.belongsTo(User)", "User", "uuid");
        assert!(err.is_unknown_target_key());
        assert_eq!(
            err.to_string(),
            "Post.belongsTo(User): entity `User` has no attribute `uuid` to reference"
        );
    }

    #[test]
    fn ambiguous_self_reference_message() {
        let err = Error::ambiguous_self_reference("Person.hasOne(Person)");
        assert!(err.is_ambiguous_self_reference());
        assert_eq!(
            err.to_string(),
            "Person.hasOne(Person): self-referencing associations require an alias"
        );
    }

    #[test]
    fn invalid_schema_message() {
        let err = Error::invalid_schema("entity id 9 is not registered");
        assert!(err.is_invalid_schema());
        assert_eq!(
            err.to_string(),
            "invalid schema: entity id 9 is not registered"
        );
    }
}
