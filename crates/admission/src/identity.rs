//! Caller identification.
//!
//! The provider set is closed: the kind string from the config is looked up in
//! [`PROVIDERS`] and anything else is rejected at startup.

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, HeaderName};
use gatehouse_rbac::{Identity, StoreError, UserStore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::errors::AdmissionError;

pub const TOKEN_HEADER: &str = "x-gatehouse-token";
pub const DEFAULT_USER_HEADER: &str = "x-gatehouse-user";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    pub provider: String,
    /// Token to user name, for `static-token`.
    pub tokens: BTreeMap<String, String>,
    /// Header carrying the user name, for `trusted-header`.
    pub header: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: "anonymous".to_string(),
            tokens: BTreeMap::new(),
            header: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum IdentityProvider {
    /// Never identifies anyone.
    Anonymous,
    /// Bearer or `x-gatehouse-token` credential mapped through a fixed table.
    StaticToken { tokens: Vec<(String, String)> },
    /// User name set by a fronting proxy.
    TrustedHeader { header: HeaderName },
}

type ProviderBuilder = fn(&AuthConfig) -> Result<IdentityProvider, AdmissionError>;

pub const PROVIDERS: &[(&str, ProviderBuilder)] = &[
    ("anonymous", build_anonymous),
    ("static-token", build_static_token),
    ("trusted-header", build_trusted_header),
];

fn build_anonymous(_: &AuthConfig) -> Result<IdentityProvider, AdmissionError> {
    Ok(IdentityProvider::Anonymous)
}

fn build_static_token(config: &AuthConfig) -> Result<IdentityProvider, AdmissionError> {
    if config.tokens.is_empty() {
        return Err(AdmissionError::ProviderConfig {
            provider: "static-token",
            field: "at least one entry in auth.tokens",
        });
    }
    Ok(IdentityProvider::StaticToken {
        tokens: config
            .tokens
            .iter()
            .map(|(token, user)| (token.clone(), user.clone()))
            .collect(),
    })
}

fn build_trusted_header(config: &AuthConfig) -> Result<IdentityProvider, AdmissionError> {
    let raw = config.header.as_deref().unwrap_or(DEFAULT_USER_HEADER);
    let header =
        HeaderName::from_bytes(raw.as_bytes()).map_err(|_| AdmissionError::ProviderConfig {
            provider: "trusted-header",
            field: "a valid auth.header name",
        })?;
    Ok(IdentityProvider::TrustedHeader { header })
}

impl IdentityProvider {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AdmissionError> {
        let kind = config.provider.trim();
        let (_, build) = PROVIDERS
            .iter()
            .find(|(name, _)| *name == kind)
            .ok_or_else(|| AdmissionError::UnknownProvider(kind.to_string()))?;
        build(config)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdentityProvider::Anonymous => "anonymous",
            IdentityProvider::StaticToken { .. } => "static-token",
            IdentityProvider::TrustedHeader { .. } => "trusted-header",
        }
    }

    /// Raw credential presented by the caller.
    pub fn token(&self, headers: &HeaderMap) -> Option<String> {
        match self {
            IdentityProvider::Anonymous => None,
            IdentityProvider::StaticToken { .. } => bearer_token(headers),
            IdentityProvider::TrustedHeader { header } => header_value(headers, header.as_str()),
        }
    }

    /// User name the presented credential stands for.
    pub fn user_name(&self, headers: &HeaderMap) -> Option<String> {
        let token = self.token(headers)?;
        match self {
            IdentityProvider::Anonymous => None,
            IdentityProvider::StaticToken { tokens } => tokens
                .iter()
                .find(|(known, _)| known.as_bytes().ct_eq(token.as_bytes()).unwrap_u8() == 1)
                .map(|(_, user)| user.clone()),
            IdentityProvider::TrustedHeader { .. } => Some(token),
        }
    }

    /// Looks the presented user up in `users`. Unknown names yield `None`.
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        users: &dyn UserStore,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(name) = self.user_name(headers) else {
            return Ok(None);
        };
        match users.get_user_by_name(&name).await? {
            Some(user) => Ok(Some(Identity::new(user.id, user.name))),
            None => {
                debug!(provider = self.kind(), user = %name, "credential names unknown user");
                Ok(None)
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    header_value(headers, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer ").map(|token| token.trim().to_string()))
        .filter(|token| !token.is_empty())
        .or_else(|| header_value(headers, TOKEN_HEADER))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use gatehouse_rbac::{InMemoryRepository, NewUser, Repository};

    use super::*;

    fn static_config() -> AuthConfig {
        AuthConfig {
            provider: "static-token".into(),
            tokens: BTreeMap::from([("s3cret".to_string(), "alice".to_string())]),
            header: None,
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = AuthConfig {
            provider: "oauth".into(),
            ..AuthConfig::default()
        };
        let err = IdentityProvider::from_config(&config).unwrap_err();
        assert!(matches!(err, AdmissionError::UnknownProvider(kind) if kind == "oauth"));
    }

    #[test]
    fn static_token_requires_tokens() {
        let config = AuthConfig {
            provider: "static-token".into(),
            ..AuthConfig::default()
        };
        assert!(matches!(
            IdentityProvider::from_config(&config),
            Err(AdmissionError::ProviderConfig { provider: "static-token", .. })
        ));
    }

    #[test]
    fn static_token_reads_bearer_and_custom_header() {
        let provider = IdentityProvider::from_config(&static_config()).unwrap();
        assert_eq!(provider.kind(), "static-token");

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert_eq!(provider.user_name(&headers).as_deref(), Some("alice"));

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert_eq!(provider.user_name(&headers).as_deref(), Some("alice"));

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("wrong"));
        assert_eq!(provider.user_name(&headers), None);
    }

    #[test]
    fn trusted_header_uses_configured_name() {
        let config = AuthConfig {
            provider: "trusted-header".into(),
            header: Some("X-Remote-User".into()),
            ..AuthConfig::default()
        };
        let provider = IdentityProvider::from_config(&config).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-remote-user", HeaderValue::from_static(" bob "));
        assert_eq!(provider.user_name(&headers).as_deref(), Some("bob"));
    }

    #[test]
    fn anonymous_never_identifies() {
        let provider = IdentityProvider::from_config(&AuthConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert_eq!(provider.token(&headers), None);
        assert_eq!(provider.user_name(&headers), None);
    }

    #[tokio::test]
    async fn resolve_looks_up_known_users_only() {
        let repo = InMemoryRepository::new();
        let alice = repo
            .users()
            .create_user(NewUser {
                name: "alice".into(),
                email: String::new(),
            })
            .await
            .unwrap();
        let provider = IdentityProvider::from_config(&AuthConfig {
            tokens: BTreeMap::from([
                ("s3cret".to_string(), "alice".to_string()),
                ("ghost".to_string(), "nobody".to_string()),
            ]),
            ..static_config()
        })
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        let identity = provider.resolve(&headers, repo.users()).await.unwrap();
        assert_eq!(identity, Some(Identity::new(alice.id, "alice")));

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("ghost"));
        assert_eq!(provider.resolve(&headers, repo.users()).await.unwrap(), None);
    }
}
