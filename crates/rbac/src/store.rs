//! Storage ports consumed by the authorizer and the provisioning helpers.
//!
//! Each entity gets its own narrow trait; [`Repository`] bundles them so
//! callers can hold one handle without depending on a concrete backend.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::model::{
    Group, GroupId, GroupWithRoles, NewGroup, NewRole, NewUser, Resource, Role, RoleId, User,
    UserId,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn create_group(&self, group: NewGroup) -> Result<Group, StoreError>;
    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StoreError>;
    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, StoreError>;
    /// Removes the group along with its memberships and role bindings.
    async fn delete_group(&self, id: GroupId) -> Result<(), StoreError>;
    async fn add_member(&self, group: GroupId, user: UserId) -> Result<(), StoreError>;
    async fn bind_role(&self, group: GroupId, role: RoleId) -> Result<(), StoreError>;
    /// Groups the user belongs to, each with the roles bound to it.
    async fn groups_for_user(&self, user: UserId) -> Result<Vec<GroupWithRoles>, StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn create_role(&self, role: NewRole) -> Result<Role, StoreError>;
    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError>;
    async fn bind_user(&self, role: RoleId, user: UserId) -> Result<(), StoreError>;
    /// Roles bound directly to the user.
    async fn roles_for_user(&self, user: UserId) -> Result<Vec<Role>, StoreError>;
    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError>;
}

#[async_trait]
pub trait Repository: Send + Sync {
    fn users(&self) -> &dyn UserStore;
    fn groups(&self) -> &dyn GroupStore;
    fn roles(&self) -> &dyn RoleStore;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
