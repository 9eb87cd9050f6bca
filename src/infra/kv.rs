//! REST adapter for the external key-value store backing view counters.
//!
//! Speaks the Upstash-style HTTP protocol: one command per request
//! (`GET {endpoint}/get/{key}`, `POST {endpoint}/incr/{key}`) authenticated
//! with a bearer token, replies wrapped in a JSON `{"result": ...}` envelope.
//! The store may return counters as JSON numbers or as decimal strings;
//! both are accepted.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

use crate::application::stores::{StoreError, ViewStore};
use crate::config::ViewsSettings;
use crate::infra::error::InfraError;

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
}

pub struct RestKvStore {
    client: Client,
    endpoint: Url,
    token: String,
}

impl RestKvStore {
    /// Build a store client from settings, or `None` when the store is not
    /// configured (the server then runs with view counters disabled).
    pub fn from_settings(settings: &ViewsSettings) -> Result<Option<Self>, InfraError> {
        let (Some(endpoint), Some(token)) = (settings.endpoint.as_ref(), settings.token.as_ref())
        else {
            return Ok(None);
        };

        // Normalize to a trailing slash so Url::join keeps the full path.
        let normalized = format!("{}/", endpoint.trim_end_matches('/'));
        let endpoint = Url::parse(&normalized)
            .map_err(|err| InfraError::configuration(format!("views.endpoint: {err}")))?;

        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Some(Self {
            client,
            endpoint,
            token: token.clone(),
        }))
    }

    fn command_url(&self, verb: &str, key: &str) -> Result<Url, StoreError> {
        self.endpoint
            .join(&format!("{verb}/{key}"))
            .map_err(|err| StoreError::Malformed(format!("invalid command url: {err}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<CommandReply, StoreError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CommandReply>()
            .await
            .map_err(|err| StoreError::Malformed(err.to_string()))
    }
}

fn user_agent() -> &'static str {
    concat!("zefiro/", env!("CARGO_PKG_VERSION"))
}

#[async_trait]
impl ViewStore for RestKvStore {
    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let url = self.command_url("incr", key)?;
        let reply = self.send(self.client.post(url)).await?;
        match reply.result {
            Some(value) if !value.is_null() => parse_count(value),
            _ => Err(StoreError::Malformed(
                "INCR reply carried no result".to_string(),
            )),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let url = self.command_url("get", key)?;
        let reply = self.send(self.client.get(url)).await?;
        match reply.result {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(value) => parse_count(value).map(Some),
        }
    }
}

fn parse_count(value: serde_json::Value) -> Result<u64, StoreError> {
    match value {
        serde_json::Value::Number(number) => number.as_u64().ok_or_else(|| {
            StoreError::Malformed(format!("counter out of range: {number}"))
        }),
        serde_json::Value::String(text) => text.parse::<u64>().map_err(|err| {
            StoreError::Malformed(format!("counter `{text}` is not an unsigned integer: {err}"))
        }),
        other => Err(StoreError::Malformed(format!(
            "unexpected counter payload: {other}"
        ))),
    }
}

/// Placeholder store used when no endpoint is configured. Every operation
/// reports `Disabled`, which the counter service treats as zero views.
pub struct DisabledViewStore;

#[async_trait]
impl ViewStore for DisabledViewStore {
    async fn incr(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn get(&self, _key: &str) -> Result<Option<u64>, StoreError> {
        Err(StoreError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store(endpoint: &str) -> RestKvStore {
        RestKvStore::from_settings(&ViewsSettings {
            endpoint: Some(endpoint.to_string()),
            token: Some("secret".to_string()),
            request_timeout: Duration::from_millis(500),
        })
        .expect("valid settings")
        .expect("configured store")
    }

    #[test]
    fn command_urls_keep_the_endpoint_path() {
        let store = store("https://kv.example.dev/redis");
        let url = store
            .command_url("incr", "pageviews:posts:contract-creation")
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "https://kv.example.dev/redis/incr/pageviews:posts:contract-creation"
        );
    }

    #[test]
    fn trailing_slash_endpoints_do_not_double_up() {
        let store = store("https://kv.example.dev/");
        let url = store.command_url("get", "pageviews:posts:x").expect("valid url");
        assert_eq!(url.as_str(), "https://kv.example.dev/get/pageviews:posts:x");
    }

    #[test]
    fn counters_parse_from_numbers_and_strings() {
        assert_eq!(parse_count(serde_json::json!(42)).expect("number"), 42);
        assert_eq!(parse_count(serde_json::json!("42")).expect("string"), 42);
        assert!(parse_count(serde_json::json!(-1)).is_err());
        assert!(parse_count(serde_json::json!("4.2")).is_err());
        assert!(parse_count(serde_json::json!([1])).is_err());
    }

    #[test]
    fn unconfigured_settings_yield_no_store() {
        let none = RestKvStore::from_settings(&ViewsSettings {
            endpoint: None,
            token: None,
            request_timeout: Duration::from_millis(500),
        })
        .expect("valid settings");
        assert!(none.is_none());
    }
}
