//! Synchronous-feeling REST client for the hospital administration API.
//!
//! One generic CRUD engine serves every entity kind; the per-kind surface is
//! the [`shared::domain::Resource`] binding, not a copied client. Every
//! boundary failure converts into [`ApiError`] and is reported to the view
//! layer; nothing here is fatal to the process.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use shared::domain::{ProcessTask, Resource};
use shared::error::ApiError;
use shared::tasks::{TaskAction, TransitionError};
use tracing::{debug, warn};
use url::Url;

pub mod ai;
pub mod config;
pub mod normalize;

pub use ai::{AiClient, AiHealth};
pub use config::{load_settings, Settings};

const SUCCESS_CODES: [u16; 3] = [200, 201, 204];

struct CachedList {
    fetched_at: Instant,
    entries: Vec<Value>,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    list_cache_ttl: Duration,
    // List-level cache only: it exists to absorb rapid consecutive
    // re-renders, not for correctness, and every mutation invalidates it.
    list_cache: Mutex<HashMap<&'static str, CachedList>>,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let base = Url::parse(&settings.api_base_url)
            .with_context(|| format!("invalid api base url '{}'", settings.api_base_url))?;
        let http = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.read_timeout())
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            list_cache_ttl: settings.list_cache_ttl(),
            list_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}/", self.base_url)
    }

    fn item_url(&self, collection: &str, id: i64) -> String {
        format!("{}/{collection}/{id}/", self.base_url)
    }

    // ---- typed surface ----------------------------------------------------

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        let entries = self.list_values(R::COLLECTION, R::PLURAL_KEY).await?;
        Ok(normalize::typed(entries))
    }

    pub async fn get<R: Resource>(&self, id: i64) -> Result<Option<R>, ApiError> {
        let Some(value) = self.get_value(R::COLLECTION, id).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn create<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        let payload = to_payload(record)?;
        let created = self.create_value(R::COLLECTION, payload).await?;
        serde_json::from_value(created).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn update<R: Resource>(&self, id: i64, record: &R) -> Result<R, ApiError> {
        let payload = to_payload(record)?;
        let updated = self.update_value(R::COLLECTION, id, payload).await?;
        serde_json::from_value(updated).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        self.delete_value(R::COLLECTION, id).await
    }

    // ---- task lifecycle ---------------------------------------------------

    /// Read-modify-write status transition: the API has no partial-update
    /// endpoint, so the full record is fetched, only `status` is mutated,
    /// and the whole record is submitted back. A record that vanished
    /// between render and dispatch surfaces as an error, never a silent
    /// drop.
    pub async fn update_task_status(
        &self,
        id: i64,
        action: TaskAction,
    ) -> Result<ProcessTask, TransitionError> {
        let Some(current) = self.get::<ProcessTask>(id).await? else {
            return Err(TransitionError::Vanished(id));
        };

        let next = current.status.apply(action)?;
        let mut updated = current;
        updated.status = next;

        debug!(task_id = id, %action, status = %next, "submitting task status transition");
        Ok(self.update(id, &updated).await?)
    }

    pub async fn start_task(&self, id: i64) -> Result<ProcessTask, TransitionError> {
        self.update_task_status(id, TaskAction::Start).await
    }

    pub async fn complete_task(&self, id: i64) -> Result<ProcessTask, TransitionError> {
        self.update_task_status(id, TaskAction::Complete).await
    }

    pub async fn cancel_task(&self, id: i64) -> Result<ProcessTask, TransitionError> {
        self.update_task_status(id, TaskAction::Cancel).await
    }

    // ---- value-level engine ----------------------------------------------

    pub async fn list_values(
        &self,
        collection: &'static str,
        plural_key: &str,
    ) -> Result<Vec<Value>, ApiError> {
        if let Some(entries) = self.cached_list(collection) {
            debug!(collection, "serving list from cache");
            return Ok(entries);
        }

        let response = self
            .http
            .get(self.collection_url(collection))
            .send()
            .await
            .map_err(transport)?;
        let body = decode_body(check_status(response).await?).await?;
        let entries = normalize::collection(body, plural_key);

        self.store_list(collection, entries.clone());
        Ok(entries)
    }

    pub async fn get_value(&self, collection: &str, id: i64) -> Result<Option<Value>, ApiError> {
        let response = self
            .http
            .get(self.item_url(collection, id))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = decode_body(check_status(response).await?).await?;
        Ok(normalize::single(body))
    }

    pub async fn create_value(
        &self,
        collection: &'static str,
        record: Value,
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(self.collection_url(collection))
            .json(&record)
            .send()
            .await
            .map_err(transport)?;
        let body = decode_body(check_status(response).await?).await?;
        self.invalidate_list(collection);
        Ok(body)
    }

    pub async fn update_value(
        &self,
        collection: &'static str,
        id: i64,
        record: Value,
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .put(self.item_url(collection, id))
            .json(&record)
            .send()
            .await
            .map_err(transport)?;
        let body = decode_body(check_status(response).await?).await?;
        self.invalidate_list(collection);
        Ok(body)
    }

    pub async fn delete_value(&self, collection: &'static str, id: i64) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.item_url(collection, id))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        self.invalidate_list(collection);
        Ok(())
    }

    // ---- list cache -------------------------------------------------------

    fn cached_list(&self, collection: &'static str) -> Option<Vec<Value>> {
        let cache = self.list_cache.lock().expect("list cache poisoned");
        let cached = cache.get(collection)?;
        if cached.fetched_at.elapsed() > self.list_cache_ttl {
            return None;
        }
        Some(cached.entries.clone())
    }

    fn store_list(&self, collection: &'static str, entries: Vec<Value>) {
        let mut cache = self.list_cache.lock().expect("list cache poisoned");
        cache.insert(
            collection,
            CachedList {
                fetched_at: Instant::now(),
                entries,
            },
        );
    }

    pub fn invalidate_list(&self, collection: &'static str) {
        let mut cache = self.list_cache.lock().expect("list cache poisoned");
        cache.remove(collection);
    }
}

fn to_payload<R: Resource>(record: &R) -> Result<Value, ApiError> {
    // Unsaved records serialize without an id key, so create payloads carry
    // no id field at all.
    serde_json::to_value(record).map_err(|err| ApiError::Decode(err.to_string()))
}

fn transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport("timeout: the request took too long to answer".into())
    } else if err.is_connect() {
        ApiError::Transport(format!("connection error: could not reach the API ({err})"))
    } else {
        ApiError::Transport(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if SUCCESS_CODES.contains(&status.as_u16()) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "api call failed");
    Err(ApiError::status(
        status.as_u16(),
        extract_api_message(&body, status),
    ))
}

/// Pulls a human-readable message out of an error body when the server
/// sent one; otherwise falls back to the raw body or the status reason.
fn extract_api_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

async fn decode_body(response: Response) -> Result<Value, ApiError> {
    let raw = response.text().await.map_err(transport)?;
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&raw).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
