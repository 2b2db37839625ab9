use super::{AssociationKind, Entity, Options};
use crate::{Error, Result};
use std_util::str;

/// The name an association is known by on its source entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) alias: Option<String>,

    /// Alias, or the target name (pluralized for collection kinds). Together
    /// with the source and target this identifies the association.
    pub(crate) name: String,

    /// Singular form of `name`
    pub(crate) singular: String,

    /// Plural form of `name`
    pub(crate) plural: String,
}

impl Identity {
    /// Resolves the identity of a declaration.
    ///
    /// An entity associated with itself must be given an alias: the default
    /// foreign-key and accessor names would collide with the entity's own
    /// key, or with a second relationship from the entity to itself.
    pub(crate) fn resolve(
        source: &Entity,
        target: &Entity,
        kind: AssociationKind,
        options: &Options,
        subject: &str,
    ) -> Result<Identity> {
        if source.id == target.id && options.alias.is_none() {
            return Err(Error::ambiguous_self_reference(subject));
        }

        if let Some(alias) = &options.alias {
            if source.attribute(alias).is_some() {
                return Err(Error::conflict(
                    subject,
                    format!(
                        "alias `{alias}` collides with attribute `{}.{alias}`",
                        source.name
                    ),
                ));
            }
        }

        let (singular, plural) = match &options.alias {
            Some(alias) if kind.is_collection() => (str::singularize(alias), alias.clone()),
            Some(alias) => (alias.clone(), str::pluralize(alias)),
            None => (target.name.as_str().to_string(), target.name.plural()),
        };

        let name = if kind.is_collection() {
            plural.clone()
        } else {
            singular.clone()
        };

        Ok(Identity {
            alias: options.alias.clone(),
            name,
            singular,
            plural,
        })
    }

    /// Prefix for a foreign key pointing at `referenced`: the singular alias
    /// if there is one, otherwise the referenced entity's name.
    pub(crate) fn key_prefix<'a>(&'a self, referenced: &'a Entity) -> &'a str {
        match self.alias {
            Some(_) => &self.singular,
            None => referenced.name.as_str(),
        }
    }
}
