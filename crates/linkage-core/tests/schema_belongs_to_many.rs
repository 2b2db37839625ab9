use linkage_core::schema::*;
use pretty_assertions::assert_eq;
use std_util::{assert_empty, assert_err, assert_ok};

fn user_and_project(builder: &mut Builder) -> (EntityId, EntityId) {
    let user = assert_ok!(builder.entity(EntityDef::new("User")));
    let project = assert_ok!(builder.entity(EntityDef::new("Project")));
    (user, project)
}

fn key_names(entity: &Entity) -> Vec<&str> {
    entity.foreign_keys().map(|attr| attr.name.as_str()).collect()
}

#[test]
fn missing_through() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let err = assert_err!(builder.belongs_to_many(user, project, Options::new()));
    assert!(err.is_missing_through());
    assert!(err.to_string().contains("User.belongsToMany(Project)"), "{err}");

    // Nothing was created under a guessed name
    let schema = assert_ok!(builder.build());
    assert_eq!(schema.entities().count(), 2);
    assert_eq!(schema.junctions().count(), 0);
}

#[test]
fn junction_is_created_by_name() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let id = assert_ok!(builder.belongs_to_many(user, project, Options::new().through("UserProjects")));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity_by_name("UserProjects").expect("junction");
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);
    assert_eq!(junction.attributes.len(), 2);
    assert!(junction.primary_key.is_none());

    let marker = junction.junction.as_ref().expect("junction marker");
    assert_eq!(marker.identity, JunctionIdentity::Composite);
    assert_eq!(marker.identity_attributes(), ["UserId", "ProjectId"]);
    assert!(marker.auto_created);

    for attr in junction.foreign_keys() {
        assert!(!attr.nullable);
        let references = attr.references.as_ref().expect("references");
        assert_eq!(references.attribute, "id");
        assert_eq!(references.on_update, ReferentialAction::Cascade);
        assert_eq!(references.on_delete, ReferentialAction::Cascade);
    }

    let association = schema.association(id);
    assert_eq!(association.name, "Projects");
    assert_eq!(association.foreign_key, AttributeRef::new(junction.id, "UserId"));
    assert_eq!(association.references, AttributeRef::new(user, "id"));

    let through = association.through.as_ref().expect("through");
    assert_eq!(through.junction, junction.id);
    assert_eq!(through.other_key, AttributeRef::new(junction.id, "ProjectId"));
    assert_eq!(through.other_references, AttributeRef::new(project, "id"));

    // Neither side gains a foreign key
    assert_empty!(key_names(schema.entity(user)));
    assert_empty!(key_names(schema.entity(project)));
}

#[test]
fn both_directions_share_one_junction() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let forward = assert_ok!(builder.belongs_to_many(user, project, Options::new().through("T")));
    let inverse = assert_ok!(builder.belongs_to_many(project, user, Options::new().through("T")));
    let schema = assert_ok!(builder.build());

    assert_eq!(schema.junctions().count(), 1);
    let junction = schema.entity_by_name("T").expect("junction");
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);

    let forward = schema.association(forward);
    let inverse = schema.association(inverse);
    assert_eq!(forward.foreign_key, inverse.through.as_ref().expect("through").other_key);
    assert_eq!(inverse.foreign_key, forward.through.as_ref().expect("through").other_key);
    assert_eq!(inverse.name, "Users");
}

#[test]
fn mismatched_key_names_conflict() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("T")));
    let err = assert_err!(builder.belongs_to_many(
        project,
        user,
        Options::new().through("T").foreign_key("projectRef"),
    ));
    assert!(err.is_conflict());

    // The failed declaration did not touch the junction
    let schema = assert_ok!(builder.build());
    let junction = schema.entity_by_name("T").expect("junction");
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);
    assert_eq!(schema.associations().count(), 1);
}

#[test]
fn junction_linking_other_entities_conflicts() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);
    let tag = assert_ok!(builder.entity(EntityDef::new("Tag")));

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("T")));
    let err = assert_err!(builder.belongs_to_many(user, tag, Options::new().through("T")));
    assert!(err.is_conflict());
    assert!(err.to_string().contains("already links `User` and `Project`"), "{err}");
}

#[test]
fn pre_defined_junction_with_primary_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);
    let membership = assert_ok!(builder.entity(
        EntityDef::new("Membership")
            .primary_key("membershipId", Type::Uuid)
            .attribute("role", Type::String),
    ));

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through(membership)));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity(membership);
    assert_eq!(junction.primary_key.as_deref(), Some("membershipId"));
    assert!(junction.attribute("role").is_some());
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);

    let marker = junction.junction.as_ref().expect("junction marker");
    assert_eq!(marker.identity, JunctionIdentity::Surrogate("membershipId".to_string()));
    assert_eq!(marker.identity_attributes(), ["membershipId"]);
    assert!(!marker.auto_created);
}

#[test]
fn pre_defined_junction_without_primary_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);
    let membership = assert_ok!(builder.entity(EntityDef::new("Membership").attribute("role", Type::String)));

    // Looked up by name
    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("Membership")));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity(membership);
    assert!(junction.primary_key.is_none());
    assert!(junction.attribute("id").is_none());

    let names: Vec<_> = junction.attributes.keys().map(String::as_str).collect();
    assert_eq!(names, ["role", "UserId", "ProjectId"]);

    let marker = junction.junction.as_ref().expect("junction marker");
    assert_eq!(marker.identity, JunctionIdentity::Composite);
}

#[test]
fn late_definition_adds_surrogate_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("T")));
    let junction = assert_ok!(builder.entity(
        EntityDef::new("T")
            .primary_key("id", Type::I64)
            .attribute("since", Type::Timestamp),
    ));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity(junction);
    assert_eq!(junction.primary_key.as_deref(), Some("id"));
    assert!(junction.attribute("since").is_some());
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);

    let marker = junction.junction.as_ref().expect("junction marker");
    assert_eq!(marker.identity, JunctionIdentity::Surrogate("id".to_string()));
    assert!(!marker.auto_created);
}

#[test]
fn late_definition_with_conflicting_key_type() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("T")));
    let err = assert_err!(builder.entity(EntityDef::new("T").attribute("UserId", Type::String)));
    assert!(err.is_conflict());

    let message = err.to_string();
    assert!(
        message.starts_with("defining `T` over the junction of the same name: "),
        "{message}"
    );
    assert!(message.contains("`T.UserId`"), "{message}");
}

#[test]
fn explicit_key_names() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    assert_ok!(builder.belongs_to_many(
        user,
        project,
        Options::new()
            .through("T")
            .foreign_key("member")
            .other_key("workspace"),
    ));
    assert_ok!(builder.belongs_to_many(
        project,
        user,
        Options::new()
            .through("T")
            .foreign_key("workspace")
            .other_key("member"),
    ));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity_by_name("T").expect("junction");
    assert_eq!(key_names(junction), ["member", "workspace"]);
}

#[test]
fn same_key_names_conflict() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let err = assert_err!(builder.belongs_to_many(
        user,
        project,
        Options::new().through("T").foreign_key("ref").other_key("ref"),
    ));
    assert!(err.is_conflict());
}

#[test]
fn unknown_source_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let err = assert_err!(builder.belongs_to_many(
        user,
        project,
        Options::new().through("T").source_key("email"),
    ));
    assert!(err.is_unknown_target_key());
    assert!(builder.entity_by_name("T").is_none());
}

#[test]
fn underscored_source_names_new_junction_keys() {
    let mut builder = Schema::builder();
    let user = assert_ok!(builder.entity(EntityDef::new("User").underscored(true)));
    let project = assert_ok!(builder.entity(EntityDef::new("Project")));

    assert_ok!(builder.belongs_to_many(user, project, Options::new().through("user_projects")));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity_by_name("user_projects").expect("junction");
    assert_eq!(key_names(junction), ["user_id", "project_id"]);
}

#[test]
fn aliased_declaration_and_plain_inverse_converge() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);

    let tasks = assert_ok!(builder.belongs_to_many(
        user,
        project,
        Options::new().alias("Tasks").through("UserProjects"),
    ));
    let users = assert_ok!(builder.belongs_to_many(project, user, Options::new().through("UserProjects")));
    let schema = assert_ok!(builder.build());

    assert_eq!(schema.junctions().count(), 1);
    let junction = schema.entity_by_name("UserProjects").expect("junction");
    assert_eq!(key_names(junction), ["UserId", "ProjectId"]);

    let tasks = schema.association(tasks);
    let users = schema.association(users);
    assert_eq!(tasks.name, "Tasks");
    assert_eq!(tasks.accessors.get.name, "getTasks");
    assert_eq!(tasks.foreign_key, users.through.as_ref().expect("through").other_key);
    assert_eq!(users.foreign_key, tasks.through.as_ref().expect("through").other_key);
}

#[test]
fn junction_key_cannot_reuse_generated_primary_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);
    let membership = assert_ok!(builder.entity(EntityDef::new("Membership")));

    let err = assert_err!(builder.belongs_to_many(
        user,
        project,
        Options::new().through("Membership").foreign_key("id"),
    ));
    assert!(err.is_conflict());
    assert!(err.to_string().contains("would reuse the primary key of `Membership`"), "{err}");

    // The junction is untouched and still usable
    assert_ok!(builder.belongs_to_many(user, project, Options::new().through(membership)));
    let schema = assert_ok!(builder.build());

    let membership = schema.entity(membership);
    assert!(membership.attribute("id").is_none());
    assert_eq!(key_names(membership), ["UserId", "ProjectId"]);
}

#[test]
fn roles_through_pre_defined_junction_with_generated_key() {
    let mut builder = Schema::builder();
    let (user, project) = user_and_project(&mut builder);
    let membership = assert_ok!(builder.entity(EntityDef::new("Membership").attribute("role", Type::String)));

    assert_ok!(builder.belongs_to_many(
        user,
        project,
        Options::new().alias("Workspaces").through(membership),
    ));
    assert_ok!(builder.belongs_to_many(
        project,
        user,
        Options::new().alias("Members").through(membership),
    ));
    let schema = assert_ok!(builder.build());

    let junction = schema.entity(membership);
    assert!(junction.primary_key.is_none());

    let names: Vec<_> = junction.attributes.keys().map(String::as_str).collect();
    assert_eq!(names, ["role", "UserId", "ProjectId"]);

    let marker = junction.junction.as_ref().expect("junction marker");
    assert_eq!(marker.identity, JunctionIdentity::Composite);
    assert_eq!(schema.associations().count(), 2);
}
