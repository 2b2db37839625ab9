use super::{
    junction::referenced_key, Accessors, Association, AssociationId, AssociationKind, Attribute,
    AttributeRef, Binding, Declaration, Entity, EntityDef, EntityId, ForeignKeySpec, Identity,
    JunctionIdentity, JunctionLink, JunctionPlan, JunctionRequest, Name, Naming, Options,
    PlannedKey, PrimaryKeyDef, ReferentialAction, Schema, Type,
};
use crate::{err, Error, Result};
use indexmap::IndexMap;

/// Registry used during the definition phase.
///
/// Entities and associations are declared in call order. Every declaration
/// is resolved against the current state without mutating it, and is only
/// committed once it is known to succeed, so a failed declaration leaves the
/// builder exactly as it was. [`Builder::build`] freezes the registry into a
/// [`Schema`].
#[derive(Debug)]
pub struct Builder {
    /// Naming convention for entities that do not pick one
    naming: Naming,

    /// Primary key added to entities declared without one
    default_primary_key: Option<(String, Type)>,

    entities: IndexMap<EntityId, Entity>,

    associations: IndexMap<AssociationId, Association>,
}

/// Where a declaration places its foreign keys.
enum Placement {
    Key { owner: EntityId, key: PlannedKey },
    Junction(JunctionPlan),
}

impl Builder {
    pub fn new() -> Self {
        Self {
            naming: Naming::CamelCase,
            default_primary_key: Some(("id".to_string(), Type::I64)),
            entities: IndexMap::new(),
            associations: IndexMap::new(),
        }
    }

    /// Derive attribute names in snake_case on entities that do not choose a
    /// convention themselves.
    pub fn underscored(&mut self, underscored: bool) -> &mut Self {
        self.naming = Naming::from_underscored(underscored);
        self
    }

    /// The primary key generated for entities declared without one. Defaults
    /// to `id: I64`.
    pub fn default_primary_key(&mut self, name: impl Into<String>, ty: Type) -> &mut Self {
        self.default_primary_key = Some((name.into(), ty));
        self
    }

    /// Do not generate primary keys; entities without a declared one have none.
    pub fn no_default_primary_key(&mut self) -> &mut Self {
        self.default_primary_key = None;
        self
    }

    /// Defines an entity.
    ///
    /// Defining an entity under the name of a junction that a many-to-many
    /// declaration created merges the definition into that junction. A
    /// primary key declared this way is kept as the junction's surrogate key.
    pub fn entity(&mut self, def: EntityDef) -> Result<EntityId> {
        if def.name.trim().is_empty() {
            return Err(Error::invalid_schema("entity name must not be empty"));
        }

        for (i, attr) in def.attributes.iter().enumerate() {
            if def.attributes[..i].iter().any(|prev| prev.name == attr.name) {
                return Err(Error::invalid_schema(format!(
                    "entity `{}` declares attribute `{}` twice",
                    def.name, attr.name
                )));
            }
        }

        if let Some(existing) = self.entity_by_name(&def.name) {
            let id = existing.id;
            let auto_created = existing
                .junction
                .as_ref()
                .is_some_and(|junction| junction.auto_created);

            if !auto_created {
                return Err(Error::entity_conflict(format!(
                    "entity `{}` is already defined",
                    def.name
                )));
            }

            let name = def.name.clone();
            return self.merge_into_junction(id, def).map_err(|err| {
                err.context(err!("defining `{name}` over the junction of the same name"))
            });
        }

        let id = self.next_entity_id();
        let mut attributes = IndexMap::new();

        let primary_key = match &def.primary_key {
            PrimaryKeyDef::Declared(name) => Some(name.clone()),
            PrimaryKeyDef::None => None,
            PrimaryKeyDef::Default => match &self.default_primary_key {
                Some((name, _)) if def.attributes.iter().any(|attr| &attr.name == name) => {
                    Some(name.clone())
                }
                Some((name, ty)) => {
                    let mut pk = Attribute::primary_key(name.clone(), *ty);
                    pk.auto = true;
                    attributes.insert(name.clone(), pk);
                    Some(name.clone())
                }
                None => None,
            },
        };

        for mut attr in def.attributes {
            if primary_key.as_ref() == Some(&attr.name) {
                attr.primary_key = true;
                attr.nullable = false;
            }
            attributes.insert(attr.name.clone(), attr);
        }

        let entity = Entity {
            id,
            name: Name::new(&def.name),
            attributes,
            primary_key,
            naming: def.naming.unwrap_or(self.naming),
            junction: None,
        };

        tracing::debug!(entity = %entity.name, ?id, primary_key = ?entity.primary_key, "entity defined");
        self.entities.insert(id, entity);
        Ok(id)
    }

    fn merge_into_junction(&mut self, id: EntityId, def: EntityDef) -> Result<EntityId> {
        let Some(junction) = self.entities.get(&id) else {
            return Err(Error::invalid_schema(format!("entity {id:?} is not registered")));
        };

        for attr in &def.attributes {
            if let Some(existing) = junction.attribute(&attr.name) {
                if existing.ty != attr.ty {
                    return Err(Error::entity_conflict(format!(
                        "attribute `{}.{}` is declared as {} but the junction key is {}",
                        def.name, attr.name, attr.ty, existing.ty
                    )));
                }
            }
        }

        let Some(junction) = self.entities.get_mut(&id) else {
            return Err(Error::invalid_schema(format!("entity {id:?} is not registered")));
        };

        for attr in def.attributes {
            match junction.attributes.get_mut(&attr.name) {
                Some(existing) => existing.primary_key |= attr.primary_key,
                None => {
                    junction.attributes.insert(attr.name.clone(), attr);
                }
            }
        }

        if let PrimaryKeyDef::Declared(pk) = def.primary_key {
            if let Some(attr) = junction.attributes.get_mut(&pk) {
                attr.primary_key = true;
                attr.nullable = false;
            }
            junction.primary_key = Some(pk.clone());
            if let Some(marker) = &mut junction.junction {
                marker.identity = JunctionIdentity::Surrogate(pk);
            }
        }

        if let Some(marker) = &mut junction.junction {
            marker.auto_created = false;
        }

        tracing::debug!(junction = %junction.name, primary_key = ?junction.primary_key, "definition merged into junction");
        Ok(id)
    }

    /// Declares that `source` belongs to `target`: the foreign key is placed
    /// on `source`.
    pub fn belongs_to(
        &mut self,
        source: EntityId,
        target: EntityId,
        options: Options,
    ) -> Result<AssociationId> {
        self.define(source, target, AssociationKind::BelongsTo, options)
    }

    /// Declares that `source` has one `target`: the foreign key is placed on
    /// `target`.
    pub fn has_one(
        &mut self,
        source: EntityId,
        target: EntityId,
        options: Options,
    ) -> Result<AssociationId> {
        self.define(source, target, AssociationKind::HasOne, options)
    }

    /// Declares that `source` has many `target`s: the foreign key is placed
    /// on `target`.
    pub fn has_many(
        &mut self,
        source: EntityId,
        target: EntityId,
        options: Options,
    ) -> Result<AssociationId> {
        self.define(source, target, AssociationKind::HasMany, options)
    }

    /// Declares a many-to-many association through the junction named by
    /// `options.through`.
    pub fn belongs_to_many(
        &mut self,
        source: EntityId,
        target: EntityId,
        options: Options,
    ) -> Result<AssociationId> {
        self.define(source, target, AssociationKind::BelongsToMany, options)
    }

    /// Declares an association of any kind.
    ///
    /// Redeclaring an association with the same source, target, name, kind
    /// and options returns the existing association. Any other redeclaration
    /// of the same source, target and name is a conflict.
    pub fn define(
        &mut self,
        source: EntityId,
        target: EntityId,
        kind: AssociationKind,
        options: Options,
    ) -> Result<AssociationId> {
        let source_entity = self.entity_or_err(source)?;
        let target_entity = self.entity_or_err(target)?;

        let subject = Declaration {
            source: source_entity.name.as_str(),
            target: target_entity.name.as_str(),
            kind,
            alias: options.alias.as_deref(),
        }
        .to_string();

        options.validate(kind, &subject)?;

        let identity = Identity::resolve(source_entity, target_entity, kind, &options, &subject)?;

        if let Some(existing) = self.find_association(source, target, &identity.name) {
            if existing.kind == kind && existing.options == options {
                tracing::debug!(association = %subject, id = ?existing.id, "identical redeclaration");
                return Ok(existing.id);
            }

            return Err(Error::conflict(
                &subject,
                format!(
                    "`{}` is already registered from `{}` to `{}`",
                    identity.name, source_entity.name, target_entity.name
                ),
            ));
        }

        let id = AssociationId(self.associations.len());

        let (placement, association) = if kind.requires_through() {
            let plan = JunctionRequest {
                source: source_entity,
                target: target_entity,
                identity: &identity,
                options: &options,
                subject: &subject,
            }
            .plan(self)?;

            let through = JunctionLink {
                junction: plan.entity,
                other_key: plan.other_key.clone(),
                other_references: plan.other_references.clone(),
            };

            let binding = Binding {
                association: id,
                target,
                foreign_key: plan.foreign_key.clone(),
                other_key: Some(plan.other_key.clone()),
                through: Some(plan.entity),
            };

            let association = Association {
                id,
                kind,
                source,
                target,
                alias: identity.alias.clone(),
                name: identity.name.clone(),
                foreign_key: plan.foreign_key.clone(),
                references: plan.references.clone(),
                through: Some(through),
                on_update: plan.on_update,
                on_delete: plan.on_delete,
                options,
                accessors: Accessors::generate(kind, &identity, binding),
            };

            (Placement::Junction(plan), association)
        } else {
            let (owner, referenced) = if kind.is_source_owned() {
                (source_entity, target_entity)
            } else {
                (target_entity, source_entity)
            };

            let target_key = referenced_key(referenced, options.target_key.as_deref(), &subject)?;

            let name = match &options.foreign_key {
                Some(name) => name.clone(),
                None => owner.naming.join(
                    identity.key_prefix(referenced),
                    referenced.primary_key.as_deref().unwrap_or(&target_key),
                ),
            };

            let key = ForeignKeySpec {
                name,
                references: AttributeRef::new(referenced.id, target_key),
                on_update: options.on_update.unwrap_or(ReferentialAction::Cascade),
                on_delete: options.on_delete,
                nullable: true,
            }
            .plan(owner, referenced, &subject)?;

            let foreign_key = AttributeRef::new(owner.id, &key.name);

            let binding = Binding {
                association: id,
                target,
                foreign_key: foreign_key.clone(),
                other_key: None,
                through: None,
            };

            let association = Association {
                id,
                kind,
                source,
                target,
                alias: identity.alias.clone(),
                name: identity.name.clone(),
                foreign_key,
                references: key.target(),
                through: None,
                on_update: key.references.on_update,
                on_delete: key.references.on_delete,
                options,
                accessors: Accessors::generate(kind, &identity, binding),
            };

            let owner = owner.id;
            (Placement::Key { owner, key }, association)
        };

        self.check_accessor_names(&association, &subject)?;

        tracing::debug!(
            association = %subject,
            ?id,
            name = %association.name,
            foreign_key = %association.foreign_key.attribute,
            on_update = %association.on_update,
            on_delete = %association.on_delete,
            "association declared"
        );

        self.commit(placement, association);
        Ok(id)
    }

    /// Freezes the registry. The returned schema is verified and read-only.
    pub fn build(self) -> Result<Schema> {
        let schema = Schema {
            entities: self.entities,
            associations: self.associations,
        };

        schema
            .verify()
            .map_err(|err| err.context(err!("frozen schema failed verification")))?;

        tracing::debug!(
            entities = schema.entities.len(),
            associations = schema.associations.len(),
            "schema built"
        );

        Ok(schema)
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities
            .values()
            .find(|entity| entity.name.as_str() == name)
    }

    pub fn association(&self, id: AssociationId) -> Option<&Association> {
        self.associations.get(&id)
    }

    pub(crate) fn entity_or_err(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(&id)
            .ok_or_else(|| Error::invalid_schema(format!("entity {id:?} is not registered")))
    }

    pub(crate) fn entity_name(&self, id: EntityId) -> &str {
        self.entities
            .get(&id)
            .map_or("<unknown>", |entity| entity.name.as_str())
    }

    pub(crate) fn next_entity_id(&self) -> EntityId {
        EntityId(self.entities.len())
    }

    /// Returns true if any foreign key references `entity.attribute`.
    pub(crate) fn is_referenced(&self, entity: EntityId, attribute: &str) -> bool {
        self.entities
            .values()
            .flat_map(|entity| entity.foreign_keys())
            .filter_map(|attr| attr.references.as_ref())
            .any(|references| references.entity == entity && references.attribute == attribute)
    }

    fn find_association(
        &self,
        source: EntityId,
        target: EntityId,
        name: &str,
    ) -> Option<&Association> {
        self.associations.values().find(|association| {
            association.source == source && association.target == target && association.name == name
        })
    }

    /// Operation names generated for one source must not collide.
    fn check_accessor_names(&self, association: &Association, subject: &str) -> Result<()> {
        let siblings = self
            .associations
            .values()
            .filter(|existing| existing.source == association.source);

        for existing in siblings {
            if let Some(name) = association
                .accessors
                .names()
                .find(|name| existing.accessors.by_name(name).is_some())
            {
                return Err(Error::conflict(
                    subject,
                    format!(
                        "accessor `{name}` is already generated by association `{}` to `{}`",
                        existing.name,
                        self.entity_name(existing.target),
                    ),
                ));
            }
        }

        Ok(())
    }

    fn commit(&mut self, placement: Placement, association: Association) {
        match placement {
            Placement::Key { owner, key } => {
                if let Some(owner) = self.entities.get_mut(&owner) {
                    key.apply(owner);
                }
            }
            Placement::Junction(plan) => plan.apply(&mut self.entities),
        }

        self.associations.insert(association.id, association);
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
