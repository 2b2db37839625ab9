use super::{Attribute, AttributeRef, Entity, ReferentialAction, References, Type};
use crate::{Error, Result};

/// A fully resolved foreign key, ready to be placed on its owner.
#[derive(Debug, Clone)]
pub(crate) struct ForeignKeySpec {
    /// Attribute name on the owner
    pub(crate) name: String,

    /// The referenced key
    pub(crate) references: AttributeRef,

    pub(crate) on_update: ReferentialAction,

    /// `None` defers to the owner: `Cascade` when the owner already declares
    /// the attribute non-nullable, `SetNull` otherwise.
    pub(crate) on_delete: Option<ReferentialAction>,

    /// Whether a newly created attribute accepts `NULL`
    pub(crate) nullable: bool,
}

/// The outcome of planning a foreign key against its owner. Planning never
/// mutates; [`PlannedKey::apply`] does, and cannot fail.
#[derive(Debug, Clone)]
pub(crate) struct PlannedKey {
    pub(crate) name: String,
    pub(crate) references: References,
    pub(crate) attach: Attach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attach {
    /// Add a new attribute
    Create { ty: Type, nullable: bool },

    /// The owner declares the attribute without a reference; add it
    Link,

    /// An identical foreign key is already attached
    Existing,
}

impl ForeignKeySpec {
    /// Plans attaching this key to `owner`, referencing `referenced`.
    ///
    /// Attaching a key identical to one already present is a no-op. A
    /// same-named attribute with a different type, reference or referential
    /// action is a conflict.
    pub(crate) fn plan(
        &self,
        owner: &Entity,
        referenced: &Entity,
        subject: &str,
    ) -> Result<PlannedKey> {
        debug_assert_eq!(referenced.id, self.references.entity);

        let Some(target) = referenced.attribute(&self.references.attribute) else {
            return Err(Error::unknown_target_key(
                subject,
                referenced.name.as_str(),
                &self.references.attribute,
            ));
        };

        let existing = owner.attribute(&self.name);

        let on_delete = self.on_delete.unwrap_or(match existing {
            Some(attr) if !attr.nullable => ReferentialAction::Cascade,
            _ => ReferentialAction::SetNull,
        });

        let references = References {
            entity: referenced.id,
            attribute: target.name.clone(),
            on_update: self.on_update,
            on_delete,
        };

        let Some(existing) = existing else {
            return Ok(PlannedKey {
                name: self.name.clone(),
                references,
                attach: Attach::Create {
                    ty: target.ty,
                    nullable: self.nullable,
                },
            });
        };

        if existing.ty != target.ty {
            return Err(Error::conflict(
                subject,
                format!(
                    "foreign key `{}.{}` has type {} but `{}.{}` has type {}",
                    owner.name, existing.name, existing.ty, referenced.name, target.name, target.ty,
                ),
            ));
        }

        let attach = match &existing.references {
            Some(current) if *current == references => Attach::Existing,
            Some(current) if current.target() == references.target() => {
                return Err(Error::conflict(
                    subject,
                    format!(
                        "foreign key `{}.{}` is already attached with ON UPDATE {} ON DELETE {}",
                        owner.name, existing.name, current.on_update, current.on_delete,
                    ),
                ));
            }
            Some(_) => {
                return Err(Error::conflict(
                    subject,
                    format!(
                        "foreign key `{}.{}` already references a different key",
                        owner.name, existing.name,
                    ),
                ));
            }
            None if existing.primary_key && owner.id == referenced.id => {
                return Err(Error::conflict(
                    subject,
                    format!(
                        "foreign key `{}` would reference the primary key it is stored in",
                        existing.name,
                    ),
                ));
            }
            None => Attach::Link,
        };

        Ok(PlannedKey {
            name: self.name.clone(),
            references,
            attach,
        })
    }
}

impl PlannedKey {
    pub(crate) fn target(&self) -> AttributeRef {
        self.references.target()
    }

    pub(crate) fn apply(self, owner: &mut Entity) {
        match self.attach {
            Attach::Create { ty, nullable } => {
                tracing::trace!(entity = %owner.name, foreign_key = %self.name, "attaching foreign key");
                let attr = Attribute {
                    name: self.name.clone(),
                    ty,
                    primary_key: false,
                    nullable,
                    auto: false,
                    references: Some(self.references),
                };
                owner.attributes.insert(self.name, attr);
            }
            Attach::Link => {
                tracing::trace!(entity = %owner.name, foreign_key = %self.name, "linking declared attribute as foreign key");
                if let Some(attr) = owner.attribute_mut(&self.name) {
                    attr.references = Some(self.references);
                }
            }
            Attach::Existing => {}
        }
    }
}
