use anyhow::{Context, Result};
use gatehouse_rbac::{provision_group, NewGroup, Repository};
use tracing::info;

use crate::config::SeedConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub roles: usize,
    pub groups: usize,
    pub bindings: usize,
}

/// Loads configured users, roles, groups and bindings into `repo`. Groups get
/// their default roles; bindings refer to principals by name.
pub async fn apply_seed(repo: &dyn Repository, seed: &SeedConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for user in &seed.users {
        repo.users()
            .create_user(user.clone())
            .await
            .with_context(|| format!("seeding user '{}'", user.name))?;
        summary.users += 1;
    }

    for role in &seed.roles {
        repo.roles()
            .create_role(role.clone())
            .await
            .with_context(|| format!("seeding role '{}'", role.name))?;
        summary.roles += 1;
    }

    for group in &seed.groups {
        let provisioned = provision_group(
            repo,
            NewGroup {
                name: group.name.clone(),
                describe: group.describe.clone(),
                creator_id: 0,
            },
        )
        .await
        .with_context(|| format!("seeding group '{}'", group.name))?;
        for member in &group.members {
            let user = repo
                .users()
                .get_user_by_name(member)
                .await?
                .with_context(|| {
                    format!("group '{}' member '{member}' is not a user", group.name)
                })?;
            repo.groups().add_member(provisioned.group.id, user.id).await?;
        }
        summary.groups += 1;
    }

    for binding in &seed.bindings {
        let role = repo
            .roles()
            .get_role_by_name(&binding.role)
            .await?
            .with_context(|| format!("binding refers to unknown role '{}'", binding.role))?;
        for name in &binding.users {
            let user = repo
                .users()
                .get_user_by_name(name)
                .await?
                .with_context(|| format!("role '{}' bound to unknown user '{name}'", role.name))?;
            repo.roles().bind_user(role.id, user.id).await?;
            summary.bindings += 1;
        }
        for name in &binding.groups {
            let group = repo
                .groups()
                .get_group_by_name(name)
                .await?
                .with_context(|| format!("role '{}' bound to unknown group '{name}'", role.name))?;
            repo.groups().bind_role(group.id, role.id).await?;
            summary.bindings += 1;
        }
    }

    info!(
        users = summary.users,
        roles = summary.roles,
        groups = summary.groups,
        bindings = summary.bindings,
        "seed applied"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use gatehouse_rbac::{
        GroupStore, InMemoryRepository, NewRole, NewUser, Operation, RoleStore, Rule, Scope,
        UserStore, ALL,
    };

    use super::*;
    use crate::config::{SeedBinding, SeedGroup};

    fn seed() -> SeedConfig {
        SeedConfig {
            users: vec![
                NewUser {
                    name: "alice".into(),
                    ..Default::default()
                },
                NewUser {
                    name: "bob".into(),
                    ..Default::default()
                },
            ],
            roles: vec![NewRole {
                name: "cluster-view".into(),
                scope: Scope::Cluster,
                namespace: String::new(),
                rules: vec![Rule::new(ALL, Operation::View)],
            }],
            groups: vec![SeedGroup {
                name: "teamA".into(),
                describe: "team A".into(),
                members: vec!["bob".into()],
            }],
            bindings: vec![SeedBinding {
                role: "cluster-view".into(),
                users: vec!["alice".into()],
                groups: vec!["teamA".into()],
            }],
        }
    }

    #[tokio::test]
    async fn seeds_principals_and_bindings() {
        let repo = InMemoryRepository::new();
        let summary = apply_seed(&repo, &seed()).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                users: 2,
                roles: 1,
                groups: 1,
                bindings: 2,
            }
        );

        let alice = repo.get_user_by_name("alice").await.unwrap().unwrap();
        let roles = repo.roles_for_user(alice.id).await.unwrap();
        assert_eq!(roles[0].name, "cluster-view");

        let bob = repo.get_user_by_name("bob").await.unwrap().unwrap();
        let groups = repo.groups_for_user(bob.id).await.unwrap();
        let mut names: Vec<_> = groups[0].roles.iter().map(|role| role.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["cluster-view", "ns-teamA-admin"]);
    }

    #[tokio::test]
    async fn unknown_binding_target_fails() {
        let mut seed = seed();
        seed.bindings[0].users.push("mallory".into());
        let repo = InMemoryRepository::new();
        let err = apply_seed(&repo, &seed).await.unwrap_err();
        assert!(err.to_string().contains("mallory"));
    }
}
