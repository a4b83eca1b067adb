pub mod audit;
pub mod authorizer;
pub mod defaults;
pub mod errors;
pub mod memory;
pub mod model;
pub mod provision;
pub mod store;

pub use audit::{AuditSink, AuthzAuditEvent, ChannelAuditSink, TracingAuditSink};
pub use authorizer::Authorizer;
pub use errors::{AuthzError, StoreError};
pub use memory::InMemoryRepository;
pub use model::{
    operation_contains, Group, GroupId, GroupWithRoles, Identity, NewGroup, NewRole, NewUser,
    Operation, Resource, Role, RoleId, Rule, Scope, User, UserId, ALL,
};
pub use provision::{provision_group, ProvisionedGroup};
pub use store::{GroupStore, Repository, RoleStore, UserStore};
