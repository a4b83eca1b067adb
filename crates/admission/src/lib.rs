//! Request admission for the Gatehouse API server.
//!
//! Every inbound request passes the configured rate limiters, is classified
//! into a [`RequestInfo`](gatehouse_request_info::RequestInfo) and, when it
//! addresses a resource, is authorized against the caller's roles.

pub mod errors;
pub mod http;
pub mod identity;
pub mod pipeline;
pub mod trace;

pub use errors::{AdmissionError, Rejection};
pub use http::{admission_middleware, AdmissionState, Caller, HttpError, DEFAULT_SLOW_REQUEST};
pub use identity::{AuthConfig, IdentityProvider, DEFAULT_USER_HEADER, TOKEN_HEADER};
pub use pipeline::{AdmissionPipeline, Admitted};
pub use trace::AdmissionTracer;
