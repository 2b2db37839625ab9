use super::{AssociationId, AssociationKind, AttributeRef, EntityId, Identity};
use std_util::str;

/// The traversal operations generated for one association.
///
/// The record holds no state of its own: every operation is a descriptor
/// bound to the association's keys, which the storage runtime dispatches
/// on. Operations that only make sense for collections are `None` on
/// singular associations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accessors {
    pub binding: Binding,

    /// `get<N>` / `get<Ns>`
    pub get: Accessor,

    /// `set<N>` / `set<Ns>`
    pub set: Accessor,

    /// `create<N>`
    pub create: Accessor,

    /// `add<N>`
    pub add: Option<Accessor>,

    /// `add<Ns>`
    pub add_many: Option<Accessor>,

    /// `remove<N>`
    pub remove: Option<Accessor>,

    /// `remove<Ns>`
    pub remove_many: Option<Accessor>,

    /// `has<N>`
    pub has: Option<Accessor>,

    /// `has<Ns>`
    pub has_all: Option<Accessor>,

    /// `count<Ns>`
    pub count: Option<Accessor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Accessor {
    /// Generated operation name, e.g. `getHomeTeam`
    pub name: String,

    pub op: AccessorOp,

    /// True if the operation takes junction attributes to write into the
    /// junction row it creates
    pub junction_payload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessorOp {
    Get,
    Set,
    Create,
    Add,
    AddMany,
    Remove,
    RemoveMany,
    Has,
    HasAll,
    Count,
}

/// What every generated operation of an association is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binding {
    pub association: AssociationId,

    pub target: EntityId,

    pub foreign_key: AttributeRef,

    /// Junction key pointing at the target, for many-to-many
    pub other_key: Option<AttributeRef>,

    /// Junction entity, for many-to-many
    pub through: Option<EntityId>,
}

impl Accessors {
    pub(crate) fn generate(kind: AssociationKind, identity: &Identity, binding: Binding) -> Self {
        let many_to_many = kind.requires_through();
        let singular = str::upper_first(&identity.singular);
        let plural = str::upper_first(&identity.plural);

        let op = |verb: &str, name: &str, op: AccessorOp| Accessor {
            name: format!("{verb}{name}"),
            op,
            junction_payload: many_to_many && op.writes_junction_row(),
        };

        if !kind.is_collection() {
            return Self {
                binding,
                get: op("get", &singular, AccessorOp::Get),
                set: op("set", &singular, AccessorOp::Set),
                create: op("create", &singular, AccessorOp::Create),
                add: None,
                add_many: None,
                remove: None,
                remove_many: None,
                has: None,
                has_all: None,
                count: None,
            };
        }

        Self {
            binding,
            get: op("get", &plural, AccessorOp::Get),
            set: op("set", &plural, AccessorOp::Set),
            create: op("create", &singular, AccessorOp::Create),
            add: Some(op("add", &singular, AccessorOp::Add)),
            add_many: Some(op("add", &plural, AccessorOp::AddMany)),
            remove: Some(op("remove", &singular, AccessorOp::Remove)),
            remove_many: Some(op("remove", &plural, AccessorOp::RemoveMany)),
            has: Some(op("has", &singular, AccessorOp::Has)),
            has_all: Some(op("has", &plural, AccessorOp::HasAll)),
            count: Some(op("count", &plural, AccessorOp::Count)),
        }
    }

    /// Iterate over every generated operation.
    pub fn iter(&self) -> impl Iterator<Item = &Accessor> + '_ {
        [&self.get, &self.set, &self.create]
            .into_iter()
            .chain(
                [
                    &self.add,
                    &self.add_many,
                    &self.remove,
                    &self.remove_many,
                    &self.has,
                    &self.has_all,
                    &self.count,
                ]
                .into_iter()
                .flatten(),
            )
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|accessor| accessor.name.as_str())
    }

    pub fn by_name(&self, name: &str) -> Option<&Accessor> {
        self.iter().find(|accessor| accessor.name == name)
    }
}

impl AccessorOp {
    /// Returns true if the operation inserts junction rows for a
    /// many-to-many association
    pub fn writes_junction_row(self) -> bool {
        matches!(
            self,
            Self::Set | Self::Create | Self::Add | Self::AddMany
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binding() -> Binding {
        Binding {
            association: AssociationId(0),
            target: EntityId(1),
            foreign_key: AttributeRef::new(EntityId(1), "TeamId"),
            other_key: None,
            through: None,
        }
    }

    fn identity(name: &str, singular: &str, plural: &str) -> Identity {
        Identity {
            alias: None,
            name: name.to_string(),
            singular: singular.to_string(),
            plural: plural.to_string(),
        }
    }

    #[test]
    fn singular_kinds() {
        let accessors = Accessors::generate(
            AssociationKind::HasOne,
            &identity("homeTeam", "homeTeam", "homeTeams"),
            binding(),
        );

        let names: Vec<_> = accessors.names().collect();
        assert_eq!(names, ["getHomeTeam", "setHomeTeam", "createHomeTeam"]);
        assert!(accessors.iter().all(|accessor| !accessor.junction_payload));
    }

    #[test]
    fn collection_kinds() {
        let accessors = Accessors::generate(
            AssociationKind::HasMany,
            &identity("Posts", "Post", "Posts"),
            binding(),
        );

        let names: Vec<_> = accessors.names().collect();
        assert_eq!(
            names,
            [
                "getPosts",
                "setPosts",
                "createPost",
                "addPost",
                "addPosts",
                "removePost",
                "removePosts",
                "hasPost",
                "hasPosts",
                "countPosts",
            ]
        );
        assert_eq!(accessors.by_name("addPosts").map(|a| a.op), Some(AccessorOp::AddMany));
        assert!(accessors.by_name("getPost").is_none());
    }

    #[test]
    fn many_to_many_writers_take_junction_payload() {
        let accessors = Accessors::generate(
            AssociationKind::BelongsToMany,
            &identity("Projects", "Project", "Projects"),
            binding(),
        );

        let with_payload: Vec<_> = accessors
            .iter()
            .filter(|accessor| accessor.junction_payload)
            .map(|accessor| accessor.name.as_str())
            .collect();

        assert_eq!(
            with_payload,
            ["setProjects", "createProject", "addProject", "addProjects"]
        );
    }
}
