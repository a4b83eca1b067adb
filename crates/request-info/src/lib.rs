//! Request classification for the admission pipeline.
//!
//! Turns an HTTP method and URL path into a [`RequestInfo`] describing the
//! resource the request addresses. Classification never fails: anything that
//! does not look like a resource path comes back as a non-resource request.
//!
//! Resource paths:
//!
//! ```text
//! /api/{version}/namespaces
//! /api/{version}/namespaces/{namespace}
//! /api/{version}/namespaces/{namespace}/{resource}
//! /api/{version}/namespaces/{namespace}/{resource}/{name}
//! /api/{version}/{resource}
//! /api/{version}/{resource}/{name}
//! /api/{version}/{resource}/{name}/{subresource}
//! ```
//!
//! Non-resource paths: `/api/{version}`, `/api`, `/healthz`, `/`, and anything
//! whose first segment is not a known API prefix.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Namespace value for requests that carry no namespace at all.
pub const NAMESPACE_NONE: &str = "";
/// Namespace assigned to resource requests outside `/namespaces/{ns}`.
pub const NAMESPACE_ROOT: &str = "root";

pub const GET_VERB: &str = "get";
pub const LIST_VERB: &str = "list";
pub const CREATE_VERB: &str = "create";
pub const UPDATE_VERB: &str = "update";
pub const PATCH_VERB: &str = "patch";
pub const DELETE_VERB: &str = "delete";

const NAMESPACES_SEGMENT: &str = "namespaces";
const DEFAULT_API_PREFIX: &str = "api";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub is_resource_request: bool,
    pub path: String,
    pub verb: String,

    pub api_prefix: String,
    pub api_version: String,
    pub namespace: String,
    /// Resource type being addressed, e.g. `users`. Not a kind.
    pub resource: String,
    pub subresource: String,
    /// Empty for collection requests.
    pub name: String,
    /// Path segments relative to the resource: `resource/name/subresource/...`.
    pub parts: Vec<String>,
}

impl RequestInfo {
    fn non_resource(method: &str, url_path: &str) -> Self {
        Self {
            is_resource_request: false,
            path: url_path.to_string(),
            verb: method.to_lowercase(),
            ..Self::default()
        }
    }
}

/// Builds [`RequestInfo`] values against a fixed set of API prefixes.
#[derive(Clone, Debug)]
pub struct RequestInfoFactory {
    api_prefixes: BTreeSet<String>,
}

impl RequestInfoFactory {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, method: &str, url_path: &str) -> RequestInfo {
        classify(method, url_path, &self.api_prefixes)
    }
}

impl Default for RequestInfoFactory {
    fn default() -> Self {
        Self::new([DEFAULT_API_PREFIX])
    }
}

/// Classifies `method` + `url_path`. Pure: equal inputs give equal outputs.
pub fn classify(method: &str, url_path: &str, known_prefixes: &BTreeSet<String>) -> RequestInfo {
    let mut info = RequestInfo::non_resource(method, url_path);

    let segments = split_path(url_path);
    if segments.len() < 3 || !known_prefixes.contains(segments[0]) {
        return info;
    }

    let mut current: &[&str] = &segments;
    info.api_prefix = current[0].to_string();
    current = &current[1..];

    info.is_resource_request = true;
    info.api_version = current[0].to_string();
    current = &current[1..];

    info.verb = verb_for_method(method).to_string();

    // /namespaces/{namespace}/{resource}/...: parts become relative to the resource.
    if current[0] == NAMESPACES_SEGMENT {
        if current.len() > 1 {
            info.namespace = current[1].to_string();
            if current.len() > 2 {
                current = &current[2..];
            }
        }
    } else {
        info.namespace = NAMESPACE_ROOT.to_string();
    }

    info.parts = current.iter().map(|part| part.to_string()).collect();

    if info.parts.len() >= 3 {
        info.subresource = info.parts[2].clone();
    }
    if info.parts.len() >= 2 {
        info.name = info.parts[1].clone();
    }
    if !info.parts.is_empty() {
        info.resource = info.parts[0].clone();
    }

    // A GET without a name addresses the collection.
    if info.name.is_empty() && info.verb == GET_VERB {
        info.verb = LIST_VERB.to_string();
    }

    info
}

fn verb_for_method(method: &str) -> &'static str {
    match method {
        "POST" => CREATE_VERB,
        "GET" | "HEAD" => GET_VERB,
        "PUT" => UPDATE_VERB,
        "PATCH" => PATCH_VERB,
        "DELETE" => DELETE_VERB,
        _ => "",
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_trims_slashes() {
        assert!(split_path("").is_empty());
        assert!(split_path("///").is_empty());
        assert_eq!(split_path("/api/v1/users/"), vec!["api", "v1", "users"]);
    }

    #[test]
    fn unknown_method_maps_to_empty_verb() {
        assert_eq!(verb_for_method("OPTIONS"), "");
        assert_eq!(verb_for_method("get"), "");
        assert_eq!(verb_for_method("HEAD"), GET_VERB);
    }

    #[test]
    fn non_resource_keeps_lowercased_method() {
        let info = RequestInfoFactory::default().classify("OPTIONS", "/healthz");
        assert!(!info.is_resource_request);
        assert_eq!(info.verb, "options");
        assert_eq!(info.path, "/healthz");
        assert!(info.parts.is_empty());
    }
}
