use tracing::{info, warn};

use crate::defaults::default_group_roles;
use crate::errors::StoreError;
use crate::model::{Group, NewGroup, NewRole, Role};
use crate::store::Repository;

#[derive(Clone, Debug)]
pub struct ProvisionedGroup {
    pub group: Group,
    /// admin, edit, view, in that order.
    pub roles: Vec<Role>,
}

/// Creates a group together with its default admin/edit/view roles and binds
/// the admin role to the group. Nothing is left behind when a step fails.
pub async fn provision_group(
    repo: &dyn Repository,
    new_group: NewGroup,
) -> Result<ProvisionedGroup, StoreError> {
    if repo.groups().get_group_by_name(&new_group.name).await?.is_some() {
        return Err(StoreError::conflict("group", &new_group.name));
    }
    let defaults = default_group_roles(&new_group.name);
    for role in &defaults {
        if repo.roles().get_role_by_name(&role.name).await?.is_some() {
            return Err(StoreError::conflict("role", &role.name));
        }
    }

    let group = repo.groups().create_group(new_group).await?;
    let mut roles = Vec::with_capacity(defaults.len());
    if let Err(err) = create_and_bind(repo, &group, defaults, &mut roles).await {
        rollback(repo, &group, &roles).await;
        return Err(err);
    }

    info!(
        group = %group.name,
        group_id = group.id,
        roles = ?roles.iter().map(|role| role.name.as_str()).collect::<Vec<_>>(),
        "provisioned group with default roles"
    );
    Ok(ProvisionedGroup { group, roles })
}

async fn create_and_bind(
    repo: &dyn Repository,
    group: &Group,
    defaults: [NewRole; 3],
    created: &mut Vec<Role>,
) -> Result<(), StoreError> {
    for role in defaults {
        created.push(repo.roles().create_role(role).await?);
    }
    if let Some(admin) = created.first() {
        repo.groups().bind_role(group.id, admin.id).await?;
    }
    Ok(())
}

async fn rollback(repo: &dyn Repository, group: &Group, roles: &[Role]) {
    for role in roles {
        if let Err(err) = repo.roles().delete_role(role.id).await {
            warn!(role = %role.name, error = %err, "failed to roll back provisioned role");
        }
    }
    if let Err(err) = repo.groups().delete_group(group.id).await {
        warn!(group = %group.name, error = %err, "failed to roll back provisioned group");
    }
}
