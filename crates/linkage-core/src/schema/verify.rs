use super::{Association, AttributeRef, Schema};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        debug_assert!(self.verify_ids_match());

        for association in self.schema.associations() {
            self.verify_foreign_key(association, &association.foreign_key, &association.references)?;

            if let Some(through) = &association.through {
                self.verify_foreign_key(association, &through.other_key, &through.other_references)?;
                self.verify_junction(association)?;
            }
        }

        self.verify_associations_are_unique()?;
        self.verify_accessor_names_are_unique()?;
        Ok(())
    }

    fn verify_ids_match(&self) -> bool {
        for (id, entity) in &self.schema.entities {
            assert_eq!(*id, entity.id);
        }

        for (id, association) in &self.schema.associations {
            assert_eq!(*id, association.id);
        }

        true
    }

    /// The key exists on its owner and references what the association says.
    fn verify_foreign_key(
        &self,
        association: &Association,
        key: &AttributeRef,
        references: &AttributeRef,
    ) -> Result<()> {
        let owner = self.schema.entity(key.entity);

        let Some(attr) = owner.attribute(&key.attribute) else {
            return Err(Error::invalid_schema(format!(
                "association `{}` names foreign key `{}.{}`, which does not exist",
                association.name, owner.name, key.attribute
            )));
        };

        match &attr.references {
            Some(current) if current.target() == *references => {}
            _ => {
                return Err(Error::invalid_schema(format!(
                    "foreign key `{}.{}` does not reference `{}.{}`",
                    owner.name,
                    key.attribute,
                    self.schema.entity(references.entity).name,
                    references.attribute,
                )))
            }
        }

        if self
            .schema
            .entity(references.entity)
            .attribute(&references.attribute)
            .is_none()
        {
            return Err(Error::unknown_target_key(
                &association.name,
                self.schema.entity(references.entity).name.as_str(),
                &references.attribute,
            ));
        }

        Ok(())
    }

    fn verify_junction(&self, association: &Association) -> Result<()> {
        let Some(through) = &association.through else {
            return Ok(());
        };

        let junction = self.schema.entity(through.junction);

        let Some(marker) = &junction.junction else {
            return Err(Error::invalid_schema(format!(
                "`{}` is used as a junction but is not marked as one",
                junction.name
            )));
        };

        if !marker.links(association.source, association.target) {
            return Err(Error::invalid_schema(format!(
                "junction `{}` does not link the entities of association `{}`",
                junction.name, association.name
            )));
        }

        for key in &marker.keys {
            if junction.attribute(&key.attribute).is_none() {
                return Err(Error::invalid_schema(format!(
                    "junction `{}` is missing key `{}`",
                    junction.name, key.attribute
                )));
            }
        }

        Ok(())
    }

    fn verify_associations_are_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for association in self.schema.associations() {
            if !seen.insert((association.source, association.target, association.name.as_str())) {
                return Err(Error::entity_conflict(format!(
                    "association `{}` from `{}` to `{}` is registered twice",
                    association.name,
                    self.schema.entity(association.source).name,
                    self.schema.entity(association.target).name,
                )));
            }
        }

        Ok(())
    }

    fn verify_accessor_names_are_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for association in self.schema.associations() {
            // A name whose singular and plural forms agree yields the same
            // accessor name twice on one association
            let names: HashSet<_> = association.accessors.names().collect();

            for name in names {
                if !seen.insert((association.source, name)) {
                    return Err(Error::entity_conflict(format!(
                        "accessor `{name}` is generated twice on `{}`",
                        self.schema.entity(association.source).name,
                    )));
                }
            }
        }

        Ok(())
    }
}
