use std::sync::Arc;
use std::time::Instant;

use gatehouse_rbac::Repository;

/// Shared by the route handlers; the admission layer has its own state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) repo: Arc<dyn Repository>,
    pub(crate) started: Instant,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            started: Instant::now(),
        }
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }
}
