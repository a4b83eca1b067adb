//! HTTP surface served by `gatehouse serve`.

mod handlers;
pub mod seed;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::{middleware, Router};
use gatehouse_admission::{
    admission_middleware, AdmissionPipeline, AdmissionState, AdmissionTracer, IdentityProvider,
};
use gatehouse_rbac::{Authorizer, InMemoryRepository, Repository};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatehouseConfig;

pub use seed::{apply_seed, SeedSummary};
pub use state::AppState;

/// Everything `serve` needs, assembled and validated from configuration.
pub struct ServerParts {
    pub repo: Arc<dyn Repository>,
    pub admission: AdmissionState,
    pub seed: SeedSummary,
}

pub async fn build(config: &GatehouseConfig) -> Result<ServerParts> {
    config.validate().context("invalid configuration")?;

    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let seed = apply_seed(repo.as_ref(), &config.seed)
        .await
        .context("failed to apply seed data")?;

    let authorizer = Arc::new(Authorizer::with_tracing_audit(Arc::clone(&repo)));
    let pipeline = AdmissionPipeline::new(
        &config.server.rate_limits,
        config.server.api_prefixes.iter().cloned(),
        authorizer,
    )
    .context("failed to build admission pipeline")?;
    let identity =
        IdentityProvider::from_config(&config.auth).context("failed to build identity provider")?;
    let admission = AdmissionState::new(Arc::new(pipeline), Arc::new(identity), Arc::clone(&repo))
        .with_tracer(AdmissionTracer::new("gatehouse.serve"))
        .with_slow_request(config.server.slow_request());

    Ok(ServerParts {
        repo,
        admission,
        seed,
    })
}

pub fn router(parts: &ServerParts) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/version", get(handlers::version))
        .route("/api/v1/roles", get(handlers::list_roles).post(handlers::create_role))
        .route("/api/v1/resources", get(handlers::list_resources))
        .route("/api/v1/groups", post(handlers::create_group))
        .route("/api/v1/groups/:id", get(handlers::get_group))
        .fallback(handlers::echo)
        .with_state(AppState::new(Arc::clone(&parts.repo)))
        .layer(middleware::from_fn_with_state(
            parts.admission.clone(),
            admission_middleware,
        ))
}

pub async fn serve(parts: ServerParts, addr: SocketAddr) -> Result<()> {
    let router = router(&parts);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind gatehouse http on {addr}"))?;
    info!("Gatehouse HTTP ready at http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("gatehouse http server exited unexpectedly")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
