//! Per-user document storage in the cloud backend.
//!
//! Documents are JSON objects addressed by `(collection, id)`. `set` replaces
//! the whole document, `update` patches top-level fields of an existing one.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

pub type Fields = Map<String, Value>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when the document does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Re-enables network access before a write. Backends without an offline
    /// mode have nothing to do.
    async fn enable_network(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Document store reached over HTTP: `GET`/`PUT`/`PATCH` on
/// `{base_url}/{collection}/{id}` with JSON bodies.
pub struct RestDocumentStore {
    client: wreq::Client,
    base_url: String,
    token: Option<String>,
}

impl RestDocumentStore {
    pub fn new(client: wreq::Client, base_url: String, token: Option<String>) -> Self {
        Self { client, base_url, token }
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, req: wreq::RequestBuilder) -> wreq::RequestBuilder {
        match &self.token {
            Some(token) => req.header(wreq::header::AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let url = self.doc_url(collection, id);
        let resp = self.authorize(self.client.get(url)).send().await.map_err(classify_transport)?;

        let code = resp.status().as_u16();
        if code == 404 {
            debug!(collection = %collection, id = %id, "document absent");
            return Ok(None);
        }
        if let Some(err) = classify_status(code) {
            return Err(err);
        }

        let doc = resp.json::<Value>().await.map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let url = self.doc_url(collection, id);
        let resp = self
            .authorize(self.client.put(url))
            .json(&doc)
            .send()
            .await
            .map_err(classify_transport)?;

        match classify_status(resp.status().as_u16()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let url = self.doc_url(collection, id);
        let resp = self
            .authorize(self.client.patch(url))
            .json(&fields)
            .send()
            .await
            .map_err(classify_transport)?;

        match classify_status(resp.status().as_u16()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// `None` for success codes.
fn classify_status(code: u16) -> Option<StoreError> {
    match code {
        200..=299 => None,
        401 => Some(StoreError::Unauthenticated),
        403 => Some(StoreError::PermissionDenied),
        404 => Some(StoreError::NotFound),
        408 | 504 => Some(StoreError::Timeout),
        429 | 502 | 503 => Some(StoreError::Unavailable),
        other => Some(StoreError::Other(format!("unexpected status {other}"))),
    }
}

fn classify_transport(err: wreq::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else if err.is_connect() {
        StoreError::Unavailable
    } else {
        StoreError::Other(err.to_string())
    }
}

/// In-process store, used when no backend URL is configured and in tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> String {
        format!("{collection}/{id}")
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.read().await.get(&Self::key(collection, id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        self.docs.write().await.insert(Self::key(collection, id), doc);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        let doc = docs.get_mut(&Self::key(collection, id)).ok_or(StoreError::NotFound)?;
        let Some(obj) = doc.as_object_mut() else {
            return Err(StoreError::Other("document is not an object".to_string()));
        };
        obj.extend(fields);
        Ok(())
    }
}
