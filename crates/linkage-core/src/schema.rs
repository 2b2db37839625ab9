mod accessor;
pub use accessor::{Accessor, AccessorOp, Accessors, Binding};

mod action;
pub use action::ReferentialAction;

mod alias;
pub(crate) use alias::Identity;

mod association;
pub(crate) use association::Declaration;
pub use association::{Association, AssociationId, AssociationKind, JunctionLink};

mod attribute;
pub use attribute::{Attribute, AttributeRef, References};

mod builder;
pub use builder::Builder;

mod entity;
pub(crate) use entity::PrimaryKeyDef;
pub use entity::{Entity, EntityDef, EntityId};

mod fk;
pub(crate) use fk::{ForeignKeySpec, PlannedKey};

mod junction;
pub(crate) use junction::{JunctionPlan, JunctionRequest};
pub use junction::{Junction, JunctionIdentity, JunctionKey};

mod name;
pub use name::{Name, Naming};

mod options;
pub use options::{Options, Through};

mod ty;
pub use ty::Type;

mod verify;

use indexmap::IndexMap;

/// The frozen result of a definition phase.
///
/// Every foreign key an association names exists on its owning entity, and
/// every junction carries its two keys.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    pub entities: IndexMap<EntityId, Entity>,

    pub associations: IndexMap<AssociationId, Association>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Get an entity by ID
    pub fn entity(&self, id: impl Into<EntityId>) -> &Entity {
        self.entities.get(&id.into()).expect("invalid entity ID")
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities
            .values()
            .find(|entity| entity.name.as_str() == name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Get an association by ID
    pub fn association(&self, id: AssociationId) -> &Association {
        self.associations
            .get(&id)
            .expect("invalid association ID")
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.values()
    }

    /// Associations declared on `source`, in declaration order.
    pub fn associations_of(&self, source: impl Into<EntityId>) -> impl Iterator<Item = &Association> {
        let source = source.into();
        self.associations
            .values()
            .filter(move |association| association.source == source)
    }

    /// Looks up an association on `source` by its name: the alias, or the
    /// target's name (pluralized for collection kinds).
    pub fn association_by_name(
        &self,
        source: impl Into<EntityId>,
        name: &str,
    ) -> Option<&Association> {
        self.associations_of(source)
            .find(|association| association.name == name)
    }

    /// Entities that realize a many-to-many association.
    pub fn junctions(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|entity| entity.is_junction())
    }
}
