//! Role, rule and identity definitions used by the authorizer.

use std::fmt;

use gatehouse_request_info::{
    CREATE_VERB, DELETE_VERB, GET_VERB, LIST_VERB, PATCH_VERB, UPDATE_VERB,
};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type GroupId = u64;
pub type RoleId = u64;
pub type ResourceId = u64;

/// Wildcard accepted for rule resources and operations.
pub const ALL: &str = "*";

pub const EDIT_VERBS: [&str; 6] = [
    CREATE_VERB,
    DELETE_VERB,
    UPDATE_VERB,
    PATCH_VERB,
    GET_VERB,
    LIST_VERB,
];
pub const VIEW_VERBS: [&str; 2] = [GET_VERB, LIST_VERB];

pub const RESOURCE_KIND: &str = "resource";
pub const MENU_KIND: &str = "menu";

pub const CUSTOM_GROUP_KIND: &str = "custom";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Cluster,
    Namespace,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Cluster => f.write_str("cluster"),
            Scope::Namespace => f.write_str("namespace"),
        }
    }
}

/// Operation granted by a rule. `*`, `edit` and `view` are verb sets; anything
/// else must equal the request verb exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    All,
    Edit,
    View,
    Verb(String),
}

impl Operation {
    pub fn contains(&self, verb: &str) -> bool {
        match self {
            Operation::All => true,
            Operation::Edit => EDIT_VERBS.contains(&verb),
            Operation::View => VIEW_VERBS.contains(&verb),
            Operation::Verb(own) => own == verb,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operation::All => ALL,
            Operation::Edit => "edit",
            Operation::View => "view",
            Operation::Verb(verb) => verb,
        }
    }
}

/// Free-function form of [`Operation::contains`].
pub fn operation_contains(op: &Operation, verb: &str) -> bool {
    op.contains(verb)
}

impl From<String> for Operation {
    fn from(value: String) -> Self {
        match value.as_str() {
            ALL => Operation::All,
            "edit" => Operation::Edit,
            "view" => Operation::View,
            _ => Operation::Verb(value),
        }
    }
}

impl From<&str> for Operation {
    fn from(value: &str) -> Self {
        Operation::from(value.to_string())
    }
}

impl From<Operation> for String {
    fn from(value: Operation) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub resource: String,
    pub operation: Operation,
}

impl Rule {
    pub fn new(resource: impl Into<String>, operation: impl Into<Operation>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    pub fn matches(&self, resource: &str, verb: &str) -> bool {
        (self.resource == ALL || self.resource == resource) && self.operation.contains(verb)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub scope: Scope,
    /// Only meaningful for [`Scope::Namespace`].
    #[serde(default)]
    pub namespace: String,
    pub rules: Vec<Rule>,
}

impl Role {
    /// Cluster roles apply everywhere; namespace roles only to their own,
    /// non-empty namespace.
    pub fn applies_to_namespace(&self, namespace: &str) -> bool {
        match self.scope {
            Scope::Cluster => true,
            Scope::Namespace => !namespace.is_empty() && self.namespace == namespace,
        }
    }

    pub fn grants(&self, resource: &str, verb: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(resource, verb))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub scope: Scope,
    #[serde(default)]
    pub namespace: String,
    pub rules: Vec<Rule>,
}

impl NewRole {
    pub fn into_role(self, id: RoleId) -> Role {
        Role {
            id,
            name: self.name,
            scope: self.scope,
            namespace: self.namespace,
            rules: self.rules,
        }
    }
}

/// Catalog entry describing an addressable resource type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub scope: Scope,
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub describe: String,
    #[serde(default)]
    pub creator_id: UserId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub describe: String,
    #[serde(default)]
    pub creator_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupWithRoles {
    pub group: Group,
    pub roles: Vec<Role>,
}

/// Caller resolved upstream of the authorizer. Read-only here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}
