use std::collections::HashSet;
use std::sync::Arc;

use gatehouse_request_info::RequestInfo;
use tracing::{debug, warn};

use crate::audit::{AuditSink, AuthzAuditEvent, TracingAuditSink};
use crate::errors::AuthzError;
use crate::model::{Identity, Role};
use crate::store::Repository;

/// Role-based authorizer. Roles come from the caller identity plus whatever
/// the repository binds to the user directly or through group membership.
pub struct Authorizer {
    repo: Arc<dyn Repository>,
    audit: Arc<dyn AuditSink>,
}

impl Authorizer {
    pub fn new(repo: Arc<dyn Repository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repo, audit }
    }

    pub fn with_tracing_audit(repo: Arc<dyn Repository>) -> Self {
        Self::new(repo, Arc::new(TracingAuditSink))
    }

    /// Decides whether `caller` may perform `info`. Denial is `Ok(false)`;
    /// errors only come from the role lookup.
    pub async fn authorize(
        &self,
        caller: Option<&Identity>,
        info: Option<&RequestInfo>,
    ) -> Result<bool, AuthzError> {
        match self.decide(caller, info).await {
            Ok(allowed) => {
                self.audit.record(AuthzAuditEvent::new(caller, info, allowed));
                Ok(allowed)
            }
            Err(err) => {
                warn!(
                    user = caller.map(|identity| identity.name.as_str()).unwrap_or_default(),
                    error = %err,
                    "authorization aborted"
                );
                Err(err)
            }
        }
    }

    async fn decide(
        &self,
        caller: Option<&Identity>,
        info: Option<&RequestInfo>,
    ) -> Result<bool, AuthzError> {
        let (Some(caller), Some(info)) = (caller, info) else {
            return Ok(false);
        };
        if caller.is_anonymous() {
            return Ok(false);
        }
        // Platform endpoints (health, metrics, discovery) bypass role checks.
        if !info.is_resource_request {
            return Ok(true);
        }

        let roles = self.effective_roles(caller).await?;
        for role in roles
            .iter()
            .filter(|role| role.applies_to_namespace(&info.namespace))
        {
            if role.grants(&info.resource, &info.verb) {
                debug!(role = %role.name, "granting rule found");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Own roles, directly bound roles and group roles, deduplicated by id.
    pub async fn effective_roles(&self, caller: &Identity) -> Result<Vec<Role>, AuthzError> {
        let bound = self.repo.roles().roles_for_user(caller.id).await?;
        let groups = self.repo.groups().groups_for_user(caller.id).await?;

        let mut seen = HashSet::new();
        let roles = caller
            .roles
            .iter()
            .cloned()
            .chain(bound)
            .chain(groups.into_iter().flat_map(|group| group.roles))
            .filter(|role| seen.insert(role.id))
            .collect();
        Ok(roles)
    }
}
