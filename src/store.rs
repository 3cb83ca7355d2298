//! Remote state: the shared key-value store.
//!
//! The store doubles as configuration, event bus, and output channel for
//! the device. It speaks the Firebase Realtime Database REST dialect:
//!
//! ```text
//! GET <url>/<namespace>/<path>.json   # JSON value, `null` when absent
//! PUT <url>/<namespace>/<path>.json   # body is the JSON value to store
//! ```
//!
//! Every read and write is a round trip. Nothing is cached, and there is
//! no compare-and-swap: a read followed by a write races with any other
//! writer.

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::model::Key;

/// Errors that can occur talking to the remote store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request for {key} failed: {source}")]
    Http {
        key: Key,
        #[source]
        source: reqwest::Error,
    },

    #[error("{key} returned HTTP {status}")]
    Status { key: Key, status: StatusCode },

    #[error("{key} holds {found}, expected {expected}")]
    Type {
        key: Key,
        expected: &'static str,
        found: Value,
    },
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// Synchronous get/put access to the remote store.
pub trait StateStore {
    /// Read a value. An absent path is `Ok(None)`, not an error.
    fn get(&self, key: Key) -> Result<Option<Value>>;

    /// Write a value, replacing whatever was there.
    fn put(&self, key: Key, value: &Value) -> Result<()>;

    /// Read a scalar as text: strings as-is, numbers in their JSON rendering.
    fn get_text(&self, key: Key) -> Result<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(found) => Err(StoreError::Type {
                key,
                expected: "a string or number",
                found,
            }),
        }
    }
}

/// The Firebase REST implementation of [`StateStore`].
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    auth: Option<String>,
}

impl FirebaseStore {
    /// A store rooted at `base_url`, e.g. `https://siteseer.firebaseio.com`.
    ///
    /// `auth`, when given, is sent as the `auth` query parameter.
    pub fn new(base_url: impl Into<String>, auth: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            auth,
        }
    }

    fn url(&self, key: Key) -> String {
        format!("{}/{}/{}.json", self.base_url, key.namespace, key.path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(secret) => request.query(&[("auth", secret)]),
            None => request,
        }
    }
}

impl StateStore for FirebaseStore {
    fn get(&self, key: Key) -> Result<Option<Value>> {
        debug!(%key, "store get");
        let response = self
            .authorized(self.client.get(self.url(key)))
            .send()
            .map_err(|source| StoreError::Http { key, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { key, status });
        }

        let value: Value = response
            .json()
            .map_err(|source| StoreError::Http { key, source })?;

        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    fn put(&self, key: Key, value: &Value) -> Result<()> {
        debug!(%key, %value, "store put");
        let response = self
            .authorized(self.client.put(self.url(key)))
            .json(value)
            .send()
            .map_err(|source| StoreError::Http { key, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { key, status });
        }
        Ok(())
    }
}
