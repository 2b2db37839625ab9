use super::{EntityId, ReferentialAction, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    /// The attribute name
    pub name: String,

    pub ty: Type,

    /// True if the attribute is the entity's (single-column) primary key
    pub primary_key: bool,

    /// True if the attribute accepts `NULL`
    pub nullable: bool,

    /// True if the builder generated this attribute rather than the caller
    /// declaring it. Only ever set on default primary keys.
    pub auto: bool,

    /// Set when the attribute is a foreign key
    pub references: Option<References>,
}

/// The target of a foreign-key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct References {
    pub entity: EntityId,
    pub attribute: String,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

/// Names an attribute of a specific entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeRef {
    pub entity: EntityId,
    pub attribute: String,
}

impl Attribute {
    /// A nullable attribute.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            nullable: true,
            auto: false,
            references: None,
        }
    }

    pub fn required(name: impl Into<String>, ty: Type) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, ty)
        }
    }

    pub(crate) fn primary_key(name: impl Into<String>, ty: Type) -> Self {
        Self {
            primary_key: true,
            ..Self::required(name, ty)
        }
    }

    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

impl References {
    pub fn target(&self) -> AttributeRef {
        AttributeRef {
            entity: self.entity,
            attribute: self.attribute.clone(),
        }
    }
}

impl AttributeRef {
    pub fn new(entity: EntityId, attribute: impl Into<String>) -> Self {
        Self {
            entity,
            attribute: attribute.into(),
        }
    }
}
