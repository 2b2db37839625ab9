use super::{Attribute, Junction, Name, Naming, Type};
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// Uniquely identifies the entity within the registry
    pub id: EntityId,

    /// Name of the entity
    pub name: Name,

    /// Attributes in declaration order. Foreign keys attached by associations
    /// are appended.
    pub attributes: IndexMap<String, Attribute>,

    /// Name of the single-attribute primary key, if the entity has one.
    /// Junction entities without a surrogate key have none.
    pub primary_key: Option<String>,

    /// Casing used for attribute names derived on this entity
    pub naming: Naming,

    /// Set when the entity realizes a many-to-many association
    pub junction: Option<Junction>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub usize);

/// Declaration of an entity, handed to [`Builder::entity`](super::Builder::entity).
#[derive(Debug, Clone)]
pub struct EntityDef {
    pub(crate) name: String,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) primary_key: PrimaryKeyDef,
    pub(crate) naming: Option<Naming>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PrimaryKeyDef {
    /// Use the builder's default primary key, if one is configured
    Default,

    /// The named attribute is the primary key
    Declared(String),

    /// No primary key at all
    None,
}

impl Entity {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub(crate) fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    pub fn primary_key_attribute(&self) -> Option<&Attribute> {
        self.primary_key
            .as_deref()
            .and_then(|name| self.attributes.get(name))
    }

    pub fn is_junction(&self) -> bool {
        self.junction.is_some()
    }

    /// Iterate over the entity's foreign-key attributes.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &Attribute> + '_ {
        self.attributes.values().filter(|attr| attr.is_foreign_key())
    }
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: vec![],
            primary_key: PrimaryKeyDef::Default,
            naming: None,
        }
    }

    /// Declares the primary key attribute. It is placed first.
    pub fn primary_key(mut self, name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        self.attributes.retain(|attr| attr.name != name);
        self.attributes.insert(0, Attribute::primary_key(name.clone(), ty));
        self.primary_key = PrimaryKeyDef::Declared(name);
        self
    }

    /// Declares that the entity has no primary key, not even the builder's
    /// default one.
    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyDef::None;
        self
    }

    /// Adds a nullable attribute.
    pub fn attribute(self, name: impl Into<String>, ty: Type) -> Self {
        self.with_attribute(Attribute::new(name, ty))
    }

    /// Adds a non-nullable attribute.
    pub fn required(self, name: impl Into<String>, ty: Type) -> Self {
        self.with_attribute(Attribute::required(name, ty))
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Derive attribute names in snake_case instead of camelCase.
    pub fn underscored(mut self, underscored: bool) -> Self {
        self.naming = Some(Naming::from_underscored(underscored));
        self
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityId({})", self.0)
    }
}

impl From<&Entity> for EntityId {
    fn from(value: &Entity) -> Self {
        value.id
    }
}

impl From<&Self> for EntityId {
    fn from(src: &Self) -> Self {
        *src
    }
}
