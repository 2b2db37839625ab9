//! Association resolution for relational schemas.
//!
//! Entities are declared on a [`schema::Builder`] together with the
//! relationships between them. Each declaration is resolved into concrete
//! foreign-key attributes, junction entities and a generated accessor
//! contract. Once every declaration is in, [`schema::Builder::build`] freezes
//! the result into a read-only [`Schema`].

mod error;
pub use error::{Error, IntoError};

pub mod schema;
pub use schema::Schema;

/// A Result type alias that uses linkage's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
