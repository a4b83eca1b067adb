use crate::model::{NewRole, Operation, Rule, Scope, ALL, MENU_KIND, RESOURCE_KIND};

pub const USER_RESOURCE: &str = "users";
pub const GROUP_RESOURCE: &str = "groups";
pub const ROLE_RESOURCE: &str = "roles";
pub const AUTH_RESOURCE: &str = "auth";
pub const NAMESPACE_RESOURCE: &str = "namespaces";
pub const CONTAINER_RESOURCE: &str = "containers";
pub const CONTAINER_LOG_RESOURCE: &str = "containers/log";
pub const POST_RESOURCE: &str = "posts";

/// Resource catalog seeded into a fresh store: `(name, scope, kind)`.
pub fn default_resources() -> Vec<(&'static str, Scope, &'static str)> {
    vec![
        (USER_RESOURCE, Scope::Cluster, RESOURCE_KIND),
        (GROUP_RESOURCE, Scope::Cluster, RESOURCE_KIND),
        (ROLE_RESOURCE, Scope::Cluster, RESOURCE_KIND),
        (AUTH_RESOURCE, Scope::Cluster, RESOURCE_KIND),
        (NAMESPACE_RESOURCE, Scope::Cluster, RESOURCE_KIND),
        (CONTAINER_RESOURCE, Scope::Namespace, RESOURCE_KIND),
        (CONTAINER_LOG_RESOURCE, Scope::Namespace, RESOURCE_KIND),
        (POST_RESOURCE, Scope::Namespace, MENU_KIND),
    ]
}

pub fn group_role_name(group: &str, suffix: &str) -> String {
    format!("ns-{group}-{suffix}")
}

/// The admin/edit/view roles every new group receives, scoped to a namespace
/// named after the group. Admin comes first.
pub fn default_group_roles(group: &str) -> [NewRole; 3] {
    let role = |suffix: &str, operation: Operation| NewRole {
        name: group_role_name(group, suffix),
        scope: Scope::Namespace,
        namespace: group.to_string(),
        rules: vec![Rule::new(ALL, operation)],
    };
    [
        role("admin", Operation::All),
        role("edit", Operation::Edit),
        role("view", Operation::View),
    ]
}
