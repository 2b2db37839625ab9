use super::{
    AttributeRef, Builder, Entity, EntityId, ForeignKeySpec, Identity, Name, Options, PlannedKey,
    ReferentialAction, Through,
};
use crate::{Error, Result};
use indexmap::IndexMap;

/// Marks an entity as the junction of a many-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    /// The two foreign keys, in the order the first declaration named them:
    /// the key to its source, then the key to its target.
    pub keys: [JunctionKey; 2],

    pub identity: JunctionIdentity,

    /// True while the junction exists only because a declaration named it.
    /// Defining an entity with the same name merges into it and clears this.
    pub auto_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JunctionKey {
    /// Foreign-key attribute on the junction
    pub attribute: String,

    /// Entity the key points at
    pub entity: EntityId,
}

/// How rows of a junction are identified.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JunctionIdentity {
    /// No surrogate key; the pair of foreign keys is unique
    Composite,

    /// The caller declared a primary key; it is kept and the pair of foreign
    /// keys is not constrained
    Surrogate(String),
}

impl Junction {
    /// The attributes that identify a row: the key pair for composite
    /// identity, the primary key otherwise.
    pub fn identity_attributes(&self) -> Vec<&str> {
        match &self.identity {
            JunctionIdentity::Composite => self
                .keys
                .iter()
                .map(|key| key.attribute.as_str())
                .collect(),
            JunctionIdentity::Surrogate(pk) => vec![pk.as_str()],
        }
    }

    pub fn links(&self, a: EntityId, b: EntityId) -> bool {
        let [first, second] = &self.keys;
        (first.entity == a && second.entity == b) || (first.entity == b && second.entity == a)
    }

    fn key_for(&self, entity: EntityId) -> Option<&JunctionKey> {
        self.keys.iter().find(|key| key.entity == entity)
    }
}

/// Everything a many-to-many declaration does to its junction, computed
/// without touching the registry.
#[derive(Debug)]
pub(crate) struct JunctionPlan {
    pub(crate) entity: EntityId,

    /// A junction created for this declaration, keys already attached
    pub(crate) create: Option<Entity>,

    /// Keys to attach to an existing junction
    pub(crate) keys: Vec<PlannedKey>,

    pub(crate) junction: Junction,

    /// The builder-generated primary key to remove from a pre-supplied
    /// junction
    pub(crate) drop_primary_key: Option<String>,

    /// Junction key pointing at the source, and what it references
    pub(crate) foreign_key: AttributeRef,
    pub(crate) references: AttributeRef,

    /// Junction key pointing at the target, and what it references
    pub(crate) other_key: AttributeRef,
    pub(crate) other_references: AttributeRef,

    pub(crate) on_update: ReferentialAction,
    pub(crate) on_delete: ReferentialAction,
}

#[derive(Clone, Copy)]
enum Resolved<'a> {
    Reuse(&'a Entity),
    Create(&'a str),
}

pub(crate) struct JunctionRequest<'a> {
    pub(crate) source: &'a Entity,
    pub(crate) target: &'a Entity,
    pub(crate) identity: &'a Identity,
    pub(crate) options: &'a Options,
    pub(crate) subject: &'a str,
}

impl JunctionRequest<'_> {
    pub(crate) fn plan(&self, builder: &Builder) -> Result<JunctionPlan> {
        let Some(through) = &self.options.through else {
            return Err(Error::missing_through(self.subject));
        };

        let resolved = match through {
            Through::Entity(id) => Resolved::Reuse(builder.entity_or_err(*id)?),
            Through::Name(name) => match builder.entity_by_name(name) {
                Some(junction) => Resolved::Reuse(junction),
                None => Resolved::Create(name),
            },
        };

        let existing = match resolved {
            Resolved::Reuse(junction) => Some(junction),
            Resolved::Create(_) => None,
        };

        if let Some(junction) = existing {
            if junction.id == self.source.id || junction.id == self.target.id {
                return Err(Error::invalid_schema(format!(
                    "{}: `{}` cannot be its own junction",
                    self.subject, junction.name
                )));
            }
        }

        let source_key = referenced_key(self.source, self.options.source_key.as_deref(), self.subject)?;
        let target_key = referenced_key(self.target, self.options.target_key.as_deref(), self.subject)?;

        let naming = existing.map_or(self.source.naming, |junction| junction.naming);

        let foreign_key = match &self.options.foreign_key {
            Some(name) => name.clone(),
            None => naming.join(
                self.source.name.as_str(),
                self.source.primary_key.as_deref().unwrap_or(&source_key),
            ),
        };

        // Only a self-referencing pair needs the alias to tell its two keys
        // apart. Otherwise both directions must derive the same name.
        let other_prefix = if self.source.id == self.target.id {
            self.identity.key_prefix(self.target)
        } else {
            self.target.name.as_str()
        };

        let other_key = match &self.options.other_key {
            Some(name) => name.clone(),
            None => naming.join(
                other_prefix,
                self.target.primary_key.as_deref().unwrap_or(&target_key),
            ),
        };

        if foreign_key == other_key {
            return Err(Error::conflict(
                self.subject,
                format!(
                    "both junction keys would be named `{foreign_key}`; set `foreignKey` or `otherKey`"
                ),
            ));
        }

        let on_update = self.options.on_update.unwrap_or(ReferentialAction::Cascade);
        let on_delete = self.options.on_delete.unwrap_or(ReferentialAction::Cascade);

        let source_spec = ForeignKeySpec {
            name: foreign_key,
            references: AttributeRef::new(self.source.id, source_key),
            on_update,
            on_delete: Some(on_delete),
            nullable: false,
        };

        let other_spec = ForeignKeySpec {
            name: other_key,
            references: AttributeRef::new(self.target.id, target_key),
            on_update,
            on_delete: Some(on_delete),
            nullable: false,
        };

        match resolved {
            Resolved::Reuse(junction) => self.plan_reuse(builder, junction, source_spec, other_spec),
            Resolved::Create(name) => {
                self.plan_create(builder.next_entity_id(), name, source_spec, other_spec)
            }
        }
    }

    fn plan_reuse(
        &self,
        builder: &Builder,
        junction: &Entity,
        source_spec: ForeignKeySpec,
        other_spec: ForeignKeySpec,
    ) -> Result<JunctionPlan> {
        match &junction.junction {
            Some(marker) => {
                self.converge(builder, junction, marker, &source_spec.name, &other_spec.name)?
            }
            None => {
                if let Some(pk) = junction.primary_key.as_deref() {
                    if pk == source_spec.name || pk == other_spec.name {
                        return Err(Error::conflict(
                            self.subject,
                            format!(
                                "junction key `{pk}` would reuse the primary key of `{}`",
                                junction.name
                            ),
                        ));
                    }
                }
            }
        }

        let source_key = source_spec.plan(junction, self.source, self.subject)?;
        let other_key = other_spec.plan(junction, self.target, self.subject)?;

        let mut drop_primary_key = None;

        let marker = match &junction.junction {
            Some(marker) => marker.clone(),
            None => {
                let identity = match junction.primary_key_attribute() {
                    Some(pk) if pk.auto && !builder.is_referenced(junction.id, &pk.name) => {
                        drop_primary_key = Some(pk.name.clone());
                        JunctionIdentity::Composite
                    }
                    Some(pk) => JunctionIdentity::Surrogate(pk.name.clone()),
                    None => JunctionIdentity::Composite,
                };

                Junction {
                    keys: [
                        JunctionKey {
                            attribute: source_key.name.clone(),
                            entity: self.source.id,
                        },
                        JunctionKey {
                            attribute: other_key.name.clone(),
                            entity: self.target.id,
                        },
                    ],
                    identity,
                    auto_created: false,
                }
            }
        };

        Ok(JunctionPlan {
            entity: junction.id,
            create: None,
            foreign_key: AttributeRef::new(junction.id, &source_key.name),
            references: source_key.target(),
            other_key: AttributeRef::new(junction.id, &other_key.name),
            other_references: other_key.target(),
            on_update: source_key.references.on_update,
            on_delete: source_key.references.on_delete,
            keys: vec![source_key, other_key],
            junction: marker,
            drop_primary_key,
        })
    }

    fn plan_create(
        &self,
        id: EntityId,
        name: &str,
        source_spec: ForeignKeySpec,
        other_spec: ForeignKeySpec,
    ) -> Result<JunctionPlan> {
        let mut junction = Entity {
            id,
            name: Name::new(name),
            attributes: IndexMap::new(),
            primary_key: None,
            naming: self.source.naming,
            junction: None,
        };

        let source_key = source_spec.plan(&junction, self.source, self.subject)?;
        let other_key = other_spec.plan(&junction, self.target, self.subject)?;

        let plan_marker = Junction {
            keys: [
                JunctionKey {
                    attribute: source_key.name.clone(),
                    entity: self.source.id,
                },
                JunctionKey {
                    attribute: other_key.name.clone(),
                    entity: self.target.id,
                },
            ],
            identity: JunctionIdentity::Composite,
            auto_created: true,
        };

        let foreign_key = AttributeRef::new(id, &source_key.name);
        let references = source_key.target();
        let other_key_ref = AttributeRef::new(id, &other_key.name);
        let other_references = other_key.target();
        let on_update = source_key.references.on_update;
        let on_delete = source_key.references.on_delete;

        source_key.apply(&mut junction);
        other_key.apply(&mut junction);
        junction.junction = Some(plan_marker.clone());

        Ok(JunctionPlan {
            entity: id,
            create: Some(junction),
            keys: vec![],
            junction: plan_marker,
            drop_primary_key: None,
            foreign_key,
            references,
            other_key: other_key_ref,
            other_references,
            on_update,
            on_delete,
        })
    }

    /// A second declaration through the same junction must link the same
    /// pair of entities under the same key names. The inverse declaration
    /// swaps which key is the foreign key and which the other key.
    fn converge(
        &self,
        builder: &Builder,
        junction: &Entity,
        marker: &Junction,
        foreign_key: &str,
        other_key: &str,
    ) -> Result<()> {
        if !marker.links(self.source.id, self.target.id) {
            let [first, second] = &marker.keys;
            return Err(Error::conflict(
                self.subject,
                format!(
                    "junction `{}` already links `{}` and `{}`",
                    junction.name,
                    builder.entity_name(first.entity),
                    builder.entity_name(second.entity),
                ),
            ));
        }

        let converges = if self.source.id == self.target.id {
            let [first, second] = &marker.keys;
            (first.attribute == foreign_key && second.attribute == other_key)
                || (first.attribute == other_key && second.attribute == foreign_key)
        } else {
            marker
                .key_for(self.source.id)
                .is_some_and(|key| key.attribute == foreign_key)
                && marker
                    .key_for(self.target.id)
                    .is_some_and(|key| key.attribute == other_key)
        };

        if !converges {
            let [first, second] = &marker.keys;
            return Err(Error::conflict(
                self.subject,
                format!(
                    "junction `{}` is keyed by `{}` and `{}`, not `{foreign_key}` and `{other_key}`",
                    junction.name, first.attribute, second.attribute,
                ),
            ));
        }

        Ok(())
    }
}

impl JunctionPlan {
    pub(crate) fn apply(self, entities: &mut IndexMap<EntityId, Entity>) {
        if let Some(junction) = self.create {
            tracing::debug!(junction = %junction.name, "creating junction entity");
            entities.insert(junction.id, junction);
            return;
        }

        let Some(junction) = entities.get_mut(&self.entity) else {
            return;
        };

        if let Some(pk) = self.drop_primary_key {
            tracing::debug!(junction = %junction.name, primary_key = %pk, "dropping generated primary key from junction");
            junction.attributes.shift_remove(&pk);
            junction.primary_key = None;
        }

        for key in self.keys {
            key.apply(junction);
        }

        junction.junction = Some(self.junction);
    }
}

/// The key on `entity` a foreign key references: `explicit`, or the primary
/// key.
pub(crate) fn referenced_key(entity: &Entity, explicit: Option<&str>, subject: &str) -> Result<String> {
    let key = match explicit {
        Some(key) => key,
        None => entity.primary_key.as_deref().ok_or_else(|| {
            Error::unknown_target_key(subject, entity.name.as_str(), "<primary key>")
        })?,
    };

    if entity.attribute(key).is_none() {
        return Err(Error::unknown_target_key(subject, entity.name.as_str(), key));
    }

    Ok(key.to_string())
}
