use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use gatehouse_admission::{Caller, HttpError};
use gatehouse_rbac::{
    provision_group, Group, GroupId, NewGroup, NewRole, Resource, Role, StoreError,
};
use gatehouse_request_info::RequestInfo;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::state::AppState;
use crate::cli::version::VersionInfo;

pub(crate) async fn healthz(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    state.repo().ping().await.map_err(|err| {
        error!(error = %err, "store ping failed");
        HttpError::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "store unavailable")
    })?;
    let uptime = Duration::from_secs(state.started.elapsed().as_secs());
    Ok(Json(json!({
        "status": "ok",
        "uptime": humantime::format_duration(uptime).to_string(),
    })))
}

pub(crate) async fn version() -> Json<VersionInfo> {
    Json(VersionInfo::current())
}

pub(crate) async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Role>>, HttpError> {
    let roles = state
        .repo()
        .roles()
        .list_roles()
        .await
        .map_err(store_error)?;
    Ok(Json(roles))
}

pub(crate) async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<NewRole>,
) -> Result<(StatusCode, Json<Role>), HttpError> {
    let role = state
        .repo()
        .roles()
        .create_role(req)
        .await
        .map_err(store_error)?;
    info!(role = %role.name, role_id = role.id, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

pub(crate) async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<Resource>>, HttpError> {
    let resources = state
        .repo()
        .roles()
        .list_resources()
        .await
        .map_err(store_error)?;
    Ok(Json(resources))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateGroupRequest {
    name: String,
    #[serde(default)]
    describe: String,
}

pub(crate) async fn create_group(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Value>), HttpError> {
    let creator_id = caller
        .0
        .as_ref()
        .map(|identity| identity.id)
        .unwrap_or_default();
    let provisioned = provision_group(
        state.repo(),
        NewGroup {
            name: req.name,
            describe: req.describe,
            creator_id,
        },
    )
    .await
    .map_err(store_error)?;
    info!(group = %provisioned.group.name, creator_id, "group created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "group": provisioned.group,
            "roles": provisioned.roles,
        })),
    ))
}

pub(crate) async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<GroupId>,
) -> Result<Json<Group>, HttpError> {
    state
        .repo()
        .groups()
        .get_group(id)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| store_error(StoreError::not_found("group", id)))
}

/// Reports how the request was classified and who made it.
pub(crate) async fn echo(
    Extension(info): Extension<RequestInfo>,
    Extension(caller): Extension<Caller>,
) -> Json<Value> {
    Json(json!({
        "request": info,
        "caller": caller.0.map(|identity| json!({"id": identity.id, "name": identity.name})),
    }))
}

fn store_error(err: StoreError) -> HttpError {
    match err {
        StoreError::Conflict { .. } => HttpError::conflict(err.to_string()),
        StoreError::Invalid { .. } => HttpError::invalid_argument(err.to_string()),
        StoreError::NotFound { .. } => {
            HttpError::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        StoreError::Unavailable(_) => {
            error!(error = %err, "store request failed");
            HttpError::internal()
        }
    }
}
