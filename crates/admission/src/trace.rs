use std::borrow::Cow;

use tracing::{span, Level, Span};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AdmissionTracer {
    pub component: Cow<'static, str>,
}

impl Default for AdmissionTracer {
    fn default() -> Self {
        Self {
            component: Cow::Borrowed("gatehouse"),
        }
    }
}

impl AdmissionTracer {
    pub fn new(component: impl Into<Cow<'static, str>>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn span(&self, method: &str, path: &str, client: &str) -> Span {
        span!(
            Level::INFO,
            "gatehouse.admission",
            request_id = %Uuid::new_v4(),
            method = method,
            path = path,
            client = client,
            component = %self.component
        )
    }
}
