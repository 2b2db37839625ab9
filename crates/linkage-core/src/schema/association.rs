use super::{Accessors, AttributeRef, EntityId, Options, ReferentialAction};
use std::fmt;

/// A resolved relationship between two entities.
///
/// Associations are immutable once registered. The attributes they name
/// already exist on the owning entities.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Association {
    pub id: AssociationId,

    pub kind: AssociationKind,

    /// The entity the association was declared on
    pub source: EntityId,

    /// The associated entity
    pub target: EntityId,

    /// Caller-chosen identity, if any
    pub alias: Option<String>,

    /// Identity of the association on its source: the alias, or the target's
    /// name (pluralized for collection kinds)
    pub name: String,

    /// The foreign-key attribute. For `BelongsTo` it lives on the source, for
    /// `HasOne`/`HasMany` on the target, for `BelongsToMany` on the junction
    /// (pointing at the source).
    pub foreign_key: AttributeRef,

    /// The key the foreign key references
    pub references: AttributeRef,

    /// The junction, for `BelongsToMany`
    pub through: Option<JunctionLink>,

    pub on_update: ReferentialAction,

    pub on_delete: ReferentialAction,

    /// The options the association was declared with
    pub options: Options,

    /// Generated traversal operations
    pub accessors: Accessors,
}

/// The junction side of a many-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionLink {
    pub junction: EntityId,

    /// Junction foreign key pointing at the target
    pub other_key: AttributeRef,

    /// The target key `other_key` references
    pub other_references: AttributeRef,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociationId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssociationKind {
    /// One-to-one, foreign key on the source
    BelongsTo,
    /// One-to-one, foreign key on the target
    HasOne,
    /// One-to-many, foreign key on the target
    HasMany,
    /// Many-to-many through a junction entity
    BelongsToMany,
}

impl AssociationKind {
    /// Returns true if the association yields a collection of targets
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany)
    }

    pub fn requires_through(self) -> bool {
        matches!(self, Self::BelongsToMany)
    }

    /// Returns true if the foreign key is placed on the source entity
    pub fn is_source_owned(self) -> bool {
        matches!(self, Self::BelongsTo)
    }

    /// Name of the declaration entry point, used in diagnostics
    pub fn method_name(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongsTo",
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
            Self::BelongsToMany => "belongsToMany",
        }
    }
}

impl Association {
    /// The entity holding the foreign key
    pub fn owner(&self) -> EntityId {
        self.foreign_key.entity
    }

    pub fn is_self_referencing(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Debug for AssociationId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "AssociationId({})", self.0)
    }
}

/// Identifies a declaration in diagnostics, e.g. `Person.hasOne(Person, as: "Father")`.
pub(crate) struct Declaration<'a> {
    pub(crate) source: &'a str,
    pub(crate) target: &'a str,
    pub(crate) kind: AssociationKind,
    pub(crate) alias: Option<&'a str>,
}

impl fmt::Display for Declaration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({}", self.source, self.kind.method_name(), self.target)?;
        if let Some(alias) = self.alias {
            write!(f, ", as: {alias:?}")?;
        }
        f.write_str(")")
    }
}
