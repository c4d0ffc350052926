//! Remote key-value store used for shared modlists and compatibility votes.
//!
//! Keys are slash-separated paths scoped under a per-identity namespace. The
//! HTTP implementation speaks the REST shape of a realtime database:
//! `GET/PUT/DELETE {base}/{namespace}/{key}.json`, with `shallow=true` to
//! list child keys.

use crate::config::global::RemoteStoreConfig;
use crate::models::error::ModError;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub trait RemoteStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, ModError>;
    fn put(&self, key: &str, value: &Value) -> Result<(), ModError>;
    fn delete(&self, key: &str) -> Result<(), ModError>;
    /// Names of the direct children under `key`, sorted.
    fn list_children(&self, key: &str) -> Result<Vec<String>, ModError>;
}

pub struct HttpRemoteStore {
    base_url: String,
    namespace: String,
    auth_token: Option<String>,
    agent: ureq::Agent,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteStoreConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(15))
            .build();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            namespace: config.namespace.trim_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            agent,
        }
    }

    /// URL for `key` without query parameters. Segments are trimmed of stray
    /// slashes; empty segments are dropped.
    pub fn url_for(&self, key: &str) -> String {
        let path = std::iter::once(self.namespace.as_str())
            .chain(key.split('/'))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}.json", self.base_url, path)
    }

    /// Request for `key` with `shallow` listing and the auth token as
    /// encoded query parameters.
    pub fn request(&self, method: &str, key: &str, shallow: bool) -> ureq::Request {
        let mut request = self.agent.request(method, &self.url_for(key));
        if shallow {
            request = request.query("shallow", "true");
        }
        if let Some(token) = &self.auth_token {
            request = request.query("auth", token);
        }
        request
    }
}

impl RemoteStore for HttpRemoteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, ModError> {
        debug!(key, "Remote get");
        let value: Value = self.request("GET", key, false).call()?.into_json()?;
        Ok((!value.is_null()).then_some(value))
    }

    fn put(&self, key: &str, value: &Value) -> Result<(), ModError> {
        debug!(key, "Remote put");
        self.request("PUT", key, false).send_json(value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ModError> {
        debug!(key, "Remote delete");
        self.request("DELETE", key, false).call()?;
        Ok(())
    }

    fn list_children(&self, key: &str) -> Result<Vec<String>, ModError> {
        let value: Value = self.request("GET", key, true).call()?.into_json()?;
        Ok(child_keys(&value))
    }
}

fn child_keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}
