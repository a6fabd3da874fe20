use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use yansi::Paint;

use super::{DocumentStore, StoreError};

static SILENT: AtomicBool = AtomicBool::new(false);

pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

fn log_output(msg: String) {
    if !SILENT.load(Ordering::Relaxed) {
        tracing::debug!("{}", msg);
    }
}

/// REST client for the hosted document store.
///
/// Wire shape:
/// - `GET  {base}/v1/collections/{collection}/documents` →
///   `{"documents": [{"id": "...", "data": {...}}, ...]}`
/// - `GET  {base}/v1/collections/{collection}/documents/{id}` →
///   `{"id": "...", "data": {...}}` (404 when absent)
/// - `PUT  {base}/v1/collections/{collection}/documents/{id}` with the
///   document body as JSON, replacing the document wholesale.
#[derive(Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RemoteStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        RemoteStore { client, base_url: base_url.into(), token: token.into() }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{}/documents", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.token))
        }
    }

    fn log_request(&self, method: &str, url: &str) {
        log_output(format!(
            "{} {}",
            Paint::new(method).fg(yansi::Color::Yellow).bold(),
            Paint::new(url).fg(yansi::Color::Cyan),
        ));
    }

    async fn send_json(&self, req: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: status.as_u16(), detail });
        }
        resp.json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentStore for RemoteStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let url = self.documents_url(collection);
        self.log_request("GET", &url);
        let payload = self.send_json(self.authorized(self.client.get(&url))).await?;
        let docs = payload
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::Decode("missing 'documents' array".into()))?;
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| StoreError::Decode("document without 'id'".into()))?;
            let data = doc.get("data").cloned().unwrap_or(Value::Null);
            out.push((id.to_string(), data));
        }
        Ok(out)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let url = self.document_url(collection, id);
        self.log_request("GET", &url);
        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: status.as_u16(), detail });
        }
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(payload.get("data").cloned().unwrap_or(payload)))
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        self.log_request("PUT", &url);
        let resp = self
            .authorized(self.client.put(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status: status.as_u16(), detail });
        }
        Ok(())
    }
}
