use super::{AssociationKind, EntityId, ReferentialAction};
use crate::{Error, Result};

/// Options recognized by every association declaration.
///
/// Every field is optional; unset fields are defaulted during resolution.
/// Options that do not apply to the declared kind are rejected before
/// anything is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Identity override. Required when an entity is associated with itself.
    pub alias: Option<String>,

    /// Foreign key name, used verbatim
    pub foreign_key: Option<String>,

    /// The key the foreign key references. For `BelongsTo` this is an
    /// attribute of the target, for `HasOne`/`HasMany` of the source, and for
    /// `BelongsToMany` the target attribute `other_key` references. Defaults
    /// to the referenced entity's primary key.
    pub target_key: Option<String>,

    /// `BelongsToMany` only: the source attribute the junction's
    /// `foreign_key` references. Defaults to the source's primary key.
    pub source_key: Option<String>,

    /// `BelongsToMany` only: name of the junction foreign key pointing at the
    /// target
    pub other_key: Option<String>,

    /// `BelongsToMany` only, and required there: the junction entity
    pub through: Option<Through>,

    pub on_delete: Option<ReferentialAction>,

    pub on_update: Option<ReferentialAction>,
}

/// How a many-to-many declaration names its junction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Through {
    /// Reuse the entity with this name, or create a junction with it
    Name(String),

    /// Reuse an already defined entity
    Entity(EntityId),
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn foreign_key(mut self, name: impl Into<String>) -> Self {
        self.foreign_key = Some(name.into());
        self
    }

    pub fn target_key(mut self, name: impl Into<String>) -> Self {
        self.target_key = Some(name.into());
        self
    }

    pub fn source_key(mut self, name: impl Into<String>) -> Self {
        self.source_key = Some(name.into());
        self
    }

    pub fn other_key(mut self, name: impl Into<String>) -> Self {
        self.other_key = Some(name.into());
        self
    }

    pub fn through(mut self, through: impl Into<Through>) -> Self {
        self.through = Some(through.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Checks the options against the association kind. `subject` identifies
    /// the declaration in errors.
    pub(crate) fn validate(&self, kind: AssociationKind, subject: &str) -> Result<()> {
        if kind.requires_through() && self.through.is_none() {
            return Err(Error::missing_through(subject));
        }

        if !kind.requires_through() {
            let many_to_many_only = [
                ("through", self.through.is_some()),
                ("otherKey", self.other_key.is_some()),
                ("sourceKey", self.source_key.is_some()),
            ];

            if let Some((option, _)) = many_to_many_only.iter().find(|(_, set)| *set) {
                return Err(Error::invalid_schema(format!(
                    "{subject}: option `{option}` only applies to belongsToMany"
                )));
            }
        }

        let names = [
            ("as", &self.alias),
            ("foreignKey", &self.foreign_key),
            ("targetKey", &self.target_key),
            ("sourceKey", &self.source_key),
            ("otherKey", &self.other_key),
        ];

        for (option, value) in names {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(Error::invalid_schema(format!(
                    "{subject}: option `{option}` must not be empty"
                )));
            }
        }

        if let Some(Through::Name(name)) = &self.through {
            if name.trim().is_empty() {
                return Err(Error::invalid_schema(format!(
                    "{subject}: option `through` must not be empty"
                )));
            }
        }

        if self.foreign_key.is_some() && self.foreign_key == self.other_key {
            return Err(Error::conflict(
                subject,
                format!(
                    "`foreignKey` and `otherKey` are both `{}`",
                    self.foreign_key.as_deref().unwrap_or_default()
                ),
            ));
        }

        Ok(())
    }
}

impl From<&str> for Through {
    fn from(value: &str) -> Self {
        Through::Name(value.to_string())
    }
}

impl From<String> for Through {
    fn from(value: String) -> Self {
        Through::Name(value)
    }
}

impl From<EntityId> for Through {
    fn from(value: EntityId) -> Self {
        Through::Entity(value)
    }
}
