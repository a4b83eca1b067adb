use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse_rbac::{Identity, Repository};
use serde_json::json;
use tracing::{error, info, warn, Instrument};

use crate::errors::Rejection;
use crate::identity::IdentityProvider;
use crate::pipeline::AdmissionPipeline;
use crate::trace::AdmissionTracer;

pub const DEFAULT_SLOW_REQUEST: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct AdmissionState {
    pipeline: Arc<AdmissionPipeline>,
    identity: Arc<IdentityProvider>,
    repo: Arc<dyn Repository>,
    tracer: AdmissionTracer,
    slow_request: Duration,
}

impl AdmissionState {
    pub fn new(
        pipeline: Arc<AdmissionPipeline>,
        identity: Arc<IdentityProvider>,
        repo: Arc<dyn Repository>,
    ) -> Self {
        Self {
            pipeline,
            identity,
            repo,
            tracer: AdmissionTracer::default(),
            slow_request: DEFAULT_SLOW_REQUEST,
        }
    }

    pub fn with_tracer(mut self, tracer: AdmissionTracer) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_slow_request(mut self, threshold: Duration) -> Self {
        self.slow_request = threshold;
        self
    }

    pub fn pipeline(&self) -> Arc<AdmissionPipeline> {
        Arc::clone(&self.pipeline)
    }
}

/// Caller attached to admitted requests; `None` for non-resource paths and
/// unidentified callers.
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<Identity>);

/// Runs the admission pipeline in front of every route. Admitted requests
/// carry their [`RequestInfo`](gatehouse_request_info::RequestInfo) and
/// [`Caller`] as extensions.
pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client = client_addr.ip().to_string();
    let span = state.tracer.span(&method, &path, &client);

    async move {
        let started = Instant::now();
        let response = match admit(&state, &method, &path, &client, req).await {
            Ok(req) => next.run(req).await,
            Err(err) => err.into_response(),
        };
        let elapsed = started.elapsed();
        log_completion(&method, &path, &client, response.status(), elapsed);
        if elapsed >= state.slow_request {
            warn!(
                latency_ms = elapsed.as_millis() as u64,
                threshold_ms = state.slow_request.as_millis() as u64,
                "slow request"
            );
        }
        response
    }
    .instrument(span)
    .await
}

async fn admit(
    state: &AdmissionState,
    method: &str,
    path: &str,
    client: &str,
    mut req: Request<Body>,
) -> Result<Request<Body>, HttpError> {
    let headers = req.headers();
    let admitted = state
        .pipeline
        .admit_with(method, path, client, move || async move {
            state
                .identity
                .resolve(headers, state.repo.users())
                .await
                .map_err(|err| {
                    error!(error = %err, "identity lookup failed");
                    Rejection::Internal(err.to_string())
                })
        })
        .await?;
    req.extensions_mut().insert(admitted.info);
    req.extensions_mut().insert(Caller(admitted.caller));
    Ok(req)
}

fn log_completion(method: &str, path: &str, client: &str, status: StatusCode, elapsed: Duration) {
    let latency_ms = elapsed.as_millis() as u64;
    let status = status.as_u16();
    if status >= 500 {
        error!(method, path, client, status, latency_ms, "request failed");
    } else if status >= 400 {
        warn!(method, path, client, status, latency_ms, "request rejected");
    } else {
        info!(method, path, client, status, latency_ms, "request completed");
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn too_many(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "too_many_requests", message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_argument", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<Rejection> for HttpError {
    fn from(value: Rejection) -> Self {
        match value {
            Rejection::TooManyRequests { .. } => HttpError::too_many(value.to_string()),
            Rejection::Unauthenticated => HttpError::unauthorized(value.to_string()),
            Rejection::Forbidden { .. } => HttpError::forbidden(value.to_string()),
            Rejection::Internal(_) => HttpError::internal(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_rate_limit::LimitType;

    use super::*;

    #[test]
    fn rejections_map_to_status_codes() {
        let cases = [
            (
                Rejection::TooManyRequests {
                    key: String::new(),
                    limit_type: LimitType::Server,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (Rejection::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                Rejection::Forbidden {
                    user: "alice".into(),
                    verb: "delete".into(),
                    resource: "users".into(),
                    namespace: "root".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Rejection::Internal("store down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (rejection, status) in cases {
            assert_eq!(HttpError::from(rejection).status(), status);
        }
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = HttpError::from(Rejection::Internal("db password wrong".into()));
        assert_eq!(err.code(), "internal");
        assert_eq!(err.message, "internal error");
    }
}
