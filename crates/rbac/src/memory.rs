//! In-memory [`Repository`] used by the server binary and tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::defaults::default_resources;
use crate::errors::StoreError;
use crate::model::{
    Group, GroupId, GroupWithRoles, NewGroup, NewRole, NewUser, Resource, Role, RoleId, User,
    UserId, CUSTOM_GROUP_KIND,
};
use crate::store::{GroupStore, Repository, RoleStore, UserStore};

#[derive(Default)]
struct State {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    roles: BTreeMap<RoleId, Role>,
    resources: Vec<Resource>,
    members: HashMap<GroupId, BTreeSet<UserId>>,
    group_roles: HashMap<GroupId, BTreeSet<RoleId>>,
    user_roles: HashMap<UserId, BTreeSet<RoleId>>,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn roles_by_ids<'a>(&self, ids: impl IntoIterator<Item = &'a RoleId>) -> Vec<Role> {
        ids.into_iter()
            .filter_map(|id| self.roles.get(id).cloned())
            .collect()
    }
}

pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    /// Creates an empty store with the default resource catalog.
    pub fn new() -> Self {
        let mut state = State::default();
        for (name, scope, kind) in default_resources() {
            let id = state.allocate_id();
            state.resources.push(Resource {
                id,
                name: name.to_string(),
                scope,
                kind: kind.to_string(),
            });
        }
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryRepository {
    async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read();
        Ok(state.users.values().find(|user| user.name == name).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        if user.name.is_empty() {
            return Err(StoreError::Invalid {
                kind: "user",
                reason: "name must not be empty".into(),
            });
        }
        let mut state = self.state.write();
        if state.users.values().any(|existing| existing.name == user.name) {
            return Err(StoreError::conflict("user", &user.name));
        }
        let id = state.allocate_id();
        let created = User {
            id,
            name: user.name,
            email: user.email,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl GroupStore for InMemoryRepository {
    async fn create_group(&self, group: NewGroup) -> Result<Group, StoreError> {
        if group.name.is_empty() {
            return Err(StoreError::Invalid {
                kind: "group",
                reason: "name must not be empty".into(),
            });
        }
        let mut state = self.state.write();
        if state.groups.values().any(|existing| existing.name == group.name) {
            return Err(StoreError::conflict("group", &group.name));
        }
        let id = state.allocate_id();
        let created = Group {
            id,
            name: group.name,
            kind: CUSTOM_GROUP_KIND.to_string(),
            describe: group.describe,
            creator_id: group.creator_id,
        };
        state.groups.insert(id, created.clone());
        Ok(created)
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self.state.read().groups.get(&id).cloned())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>, StoreError> {
        let state = self.state.read();
        Ok(state.groups.values().find(|group| group.name == name).cloned())
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.groups.remove(&id).is_none() {
            return Err(StoreError::not_found("group", id));
        }
        state.members.remove(&id);
        state.group_roles.remove(&id);
        Ok(())
    }

    async fn add_member(&self, group: GroupId, user: UserId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.groups.contains_key(&group) {
            return Err(StoreError::not_found("group", group));
        }
        if !state.users.contains_key(&user) {
            return Err(StoreError::not_found("user", user));
        }
        state.members.entry(group).or_default().insert(user);
        Ok(())
    }

    async fn bind_role(&self, group: GroupId, role: RoleId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.groups.contains_key(&group) {
            return Err(StoreError::not_found("group", group));
        }
        if !state.roles.contains_key(&role) {
            return Err(StoreError::not_found("role", role));
        }
        state.group_roles.entry(group).or_default().insert(role);
        Ok(())
    }

    async fn groups_for_user(&self, user: UserId) -> Result<Vec<GroupWithRoles>, StoreError> {
        let state = self.state.read();
        let groups = state
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user))
            .filter_map(|(group_id, _)| state.groups.get(group_id))
            .map(|group| GroupWithRoles {
                group: group.clone(),
                roles: state
                    .group_roles
                    .get(&group.id)
                    .map(|ids| state.roles_by_ids(ids))
                    .unwrap_or_default(),
            })
            .collect();
        Ok(groups)
    }
}

#[async_trait]
impl RoleStore for InMemoryRepository {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.state.read().roles.values().cloned().collect())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let state = self.state.read();
        Ok(state.roles.values().find(|role| role.name == name).cloned())
    }

    async fn create_role(&self, role: NewRole) -> Result<Role, StoreError> {
        if role.name.is_empty() {
            return Err(StoreError::Invalid {
                kind: "role",
                reason: "name must not be empty".into(),
            });
        }
        let mut state = self.state.write();
        if state.roles.values().any(|existing| existing.name == role.name) {
            return Err(StoreError::conflict("role", &role.name));
        }
        let id = state.allocate_id();
        let created = role.into_role(id);
        state.roles.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.roles.remove(&id).is_none() {
            return Err(StoreError::not_found("role", id));
        }
        for bound in state.group_roles.values_mut() {
            bound.remove(&id);
        }
        for bound in state.user_roles.values_mut() {
            bound.remove(&id);
        }
        Ok(())
    }

    async fn bind_user(&self, role: RoleId, user: UserId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.roles.contains_key(&role) {
            return Err(StoreError::not_found("role", role));
        }
        if !state.users.contains_key(&user) {
            return Err(StoreError::not_found("user", user));
        }
        state.user_roles.entry(user).or_default().insert(role);
        Ok(())
    }

    async fn roles_for_user(&self, user: UserId) -> Result<Vec<Role>, StoreError> {
        let state = self.state.read();
        Ok(state
            .user_roles
            .get(&user)
            .map(|ids| state.roles_by_ids(ids))
            .unwrap_or_default())
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.state.read().resources.clone())
    }
}

impl Repository for InMemoryRepository {
    fn users(&self) -> &dyn UserStore {
        self
    }

    fn groups(&self) -> &dyn GroupStore {
        self
    }

    fn roles(&self) -> &dyn RoleStore {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Operation, Rule, Scope};

    fn view_role(name: &str) -> NewRole {
        NewRole {
            name: name.into(),
            scope: Scope::Cluster,
            namespace: String::new(),
            rules: vec![Rule::new("*", Operation::View)],
        }
    }

    #[tokio::test]
    async fn seeds_resource_catalog() {
        let repo = InMemoryRepository::new();
        let resources = repo.list_resources().await.unwrap();
        assert!(resources.iter().any(|r| r.name == "containers/log"));
        assert!(repo.list_roles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_unique() {
        let repo = InMemoryRepository::new();
        repo.create_user(NewUser {
            name: "alice".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        let err = repo
            .create_user(NewUser {
                name: "alice".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: "user", .. }));

        repo.create_role(view_role("viewer")).await.unwrap();
        assert!(repo.create_role(view_role("viewer")).await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_role_drops_its_bindings() {
        let repo = InMemoryRepository::new();
        let user = repo
            .create_user(NewUser {
                name: "bob".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let role = repo.create_role(view_role("viewer")).await.unwrap();
        repo.bind_user(role.id, user.id).await.unwrap();
        assert_eq!(repo.roles_for_user(user.id).await.unwrap().len(), 1);

        repo.delete_role(role.id).await.unwrap();
        assert!(repo.roles_for_user(user.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_role(role.id).await,
            Err(StoreError::NotFound { kind: "role", .. })
        ));
    }

    #[tokio::test]
    async fn groups_for_user_carry_bound_roles() {
        let repo = InMemoryRepository::new();
        let user = repo
            .create_user(NewUser {
                name: "carol".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let group = repo
            .create_group(NewGroup {
                name: "teamA".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let role = repo.create_role(view_role("team-viewer")).await.unwrap();
        repo.bind_role(group.id, role.id).await.unwrap();
        repo.add_member(group.id, user.id).await.unwrap();

        let groups = repo.groups_for_user(user.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group.name, "teamA");
        assert_eq!(groups[0].roles, vec![role]);
    }

    #[tokio::test]
    async fn deleting_a_group_drops_memberships() {
        let repo = InMemoryRepository::new();
        let user = repo
            .create_user(NewUser {
                name: "dave".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let group = repo
            .create_group(NewGroup {
                name: "teamD".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.add_member(group.id, user.id).await.unwrap();

        repo.delete_group(group.id).await.unwrap();
        assert!(repo.get_group(group.id).await.unwrap().is_none());
        assert!(repo.groups_for_user(user.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_group(group.id).await,
            Err(StoreError::NotFound { kind: "group", .. })
        ));
    }
}
