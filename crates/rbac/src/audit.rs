//! Audit trail for authorization decisions.

use std::time::SystemTime;

use gatehouse_request_info::RequestInfo;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

use crate::model::{Identity, UserId};

pub const AUDIT_TARGET: &str = "gatehouse::audit";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthzAuditEvent {
    pub caller_name: String,
    pub caller_id: UserId,
    pub namespace: String,
    pub resource: String,
    pub name: String,
    pub verb: String,
    pub allowed: bool,
    pub timestamp: SystemTime,
}

impl AuthzAuditEvent {
    pub fn new(caller: Option<&Identity>, info: Option<&RequestInfo>, allowed: bool) -> Self {
        let (caller_name, caller_id) = caller
            .map(|identity| (identity.name.clone(), identity.id))
            .unwrap_or_default();
        let info = info.cloned().unwrap_or_default();
        Self {
            caller_name,
            caller_id,
            namespace: info.namespace,
            resource: info.resource,
            name: info.name,
            verb: info.verb,
            allowed,
            timestamp: SystemTime::now(),
        }
    }
}

/// Receives every decision the authorizer makes, allow and deny alike.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuthzAuditEvent);
}

/// Writes decisions as structured log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuthzAuditEvent) {
        info!(
            target: AUDIT_TARGET,
            user = %event.caller_name,
            user_id = event.caller_id,
            namespace = %event.namespace,
            resource = %event.resource,
            name = %event.name,
            verb = %event.verb,
            result = event.allowed,
            "authorize user [{}({})], namespace [{}] resource [{}({})] verb [{}], result: {}",
            event.caller_name,
            event.caller_id,
            event.namespace,
            event.resource,
            event.name,
            event.verb,
            event.allowed
        );
    }
}

/// Publishes decisions on a broadcast channel and mirrors them to the log.
/// Clones share the channel.
#[derive(Clone)]
pub struct ChannelAuditSink {
    events: broadcast::Sender<AuthzAuditEvent>,
}

impl ChannelAuditSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { events: tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthzAuditEvent> {
        self.events.subscribe()
    }
}

impl Default for ChannelAuditSink {
    fn default() -> Self {
        Self::new(128)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: AuthzAuditEvent) {
        TracingAuditSink.record(event.clone());
        // No subscribers is fine; the log line above is still written.
        let _ = self.events.send(event);
    }
}
