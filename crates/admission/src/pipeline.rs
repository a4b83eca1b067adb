use std::future::Future;
use std::sync::Arc;

use gatehouse_rate_limit::{LimitConfig, RateLimiterChain};
use gatehouse_rbac::{Authorizer, Identity};
use gatehouse_request_info::{RequestInfo, RequestInfoFactory};
use tracing::{debug, error};

use crate::errors::{AdmissionError, Rejection};

/// Rate limiting, then classification, then authorization. The first
/// rejection ends the request.
pub struct AdmissionPipeline {
    limiters: RateLimiterChain,
    classifier: RequestInfoFactory,
    authorizer: Arc<Authorizer>,
}

impl AdmissionPipeline {
    pub fn new<I, S>(
        limits: &[LimitConfig],
        api_prefixes: I,
        authorizer: Arc<Authorizer>,
    ) -> Result<Self, AdmissionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            limiters: RateLimiterChain::from_configs(limits)?,
            classifier: RequestInfoFactory::new(api_prefixes),
            authorizer,
        })
    }

    pub fn limiters(&self) -> &RateLimiterChain {
        &self.limiters
    }

    /// Runs every stage for one request with an already resolved caller.
    pub async fn admit(
        &self,
        method: &str,
        path: &str,
        client_addr: &str,
        caller: Option<&Identity>,
    ) -> Result<RequestInfo, Rejection> {
        let caller = caller.cloned();
        self.admit_with(method, path, client_addr, || async move { Ok::<_, Rejection>(caller) })
            .await
            .map(|admitted| admitted.info)
    }

    /// Like [`admit`](Self::admit), but the caller is only resolved once the
    /// request has passed the limiters and turned out to address a resource.
    pub async fn admit_with<F, Fut>(
        &self,
        method: &str,
        path: &str,
        client_addr: &str,
        resolve_caller: F,
    ) -> Result<Admitted, Rejection>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Identity>, Rejection>>,
    {
        self.limiters.accept(client_addr)?;

        let info = self.classifier.classify(method, path);
        if !info.is_resource_request {
            debug!(path = %info.path, "non-resource request admitted");
            return Ok(Admitted { info, caller: None });
        }

        let caller = resolve_caller().await?;
        match self.authorizer.authorize(caller.as_ref(), Some(&info)).await {
            Ok(true) => Ok(Admitted { info, caller }),
            Ok(false) => Err(denial(caller.as_ref(), &info)),
            Err(err) => {
                error!(error = %err, path = %info.path, "authorization lookup failed");
                Err(Rejection::Internal(err.to_string()))
            }
        }
    }
}

/// A request that passed every stage.
#[derive(Clone, Debug)]
pub struct Admitted {
    pub info: RequestInfo,
    pub caller: Option<Identity>,
}

fn denial(caller: Option<&Identity>, info: &RequestInfo) -> Rejection {
    match caller {
        Some(identity) if !identity.is_anonymous() => Rejection::Forbidden {
            user: identity.name.clone(),
            verb: info.verb.clone(),
            resource: info.resource.clone(),
            namespace: info.namespace.clone(),
        },
        _ => Rejection::Unauthenticated,
    }
}
