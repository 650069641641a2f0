//! Translates drained session-store actions into exactly one API call each
//! and a user-facing outcome. Slots are cleared at drain time, before the
//! call is made, so a failed action is reported once and never replayed.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::domain::Resource;
use shared::error::ApiError;
use shared::tasks::TransitionError;
use tracing::{info, warn};

use api_client::ApiClient;

use crate::session::{SessionStore, StatusUpdateRequest};

/// Seam between the dispatcher and the REST layer; tests script it with a
/// fake instead of a live server.
#[async_trait]
pub trait Api: Send + Sync {
    async fn create_value(&self, collection: &'static str, record: Value)
        -> Result<Value, ApiError>;
    async fn update_value(
        &self,
        collection: &'static str,
        id: i64,
        record: Value,
    ) -> Result<Value, ApiError>;
    async fn delete_value(&self, collection: &'static str, id: i64) -> Result<(), ApiError>;
    async fn apply_task_action(&self, request: StatusUpdateRequest)
        -> Result<(), TransitionError>;
}

#[async_trait]
impl Api for ApiClient {
    async fn create_value(
        &self,
        collection: &'static str,
        record: Value,
    ) -> Result<Value, ApiError> {
        ApiClient::create_value(self, collection, record).await
    }

    async fn update_value(
        &self,
        collection: &'static str,
        id: i64,
        record: Value,
    ) -> Result<Value, ApiError> {
        ApiClient::update_value(self, collection, id, record).await
    }

    async fn delete_value(&self, collection: &'static str, id: i64) -> Result<(), ApiError> {
        ApiClient::delete_value(self, collection, id).await
    }

    async fn apply_task_action(
        &self,
        request: StatusUpdateRequest,
    ) -> Result<(), TransitionError> {
        self.update_task_status(request.task_id, request.action)
            .await
            .map(|_| ())
    }
}

/// What the view layer shows after a dispatch: a message, whether the
/// action worked, and whether the page data should be refetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub ok: bool,
    pub message: String,
    pub refresh: bool,
}

impl ActionOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            refresh: true,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        // Failed actions still request a refresh so the page re-renders
        // from fetched data rather than a half-applied view.
        Self {
            ok: false,
            message: message.into(),
            refresh: true,
        }
    }
}

pub struct Dispatcher {
    api: Arc<dyn Api>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self { api }
    }

    /// Drains every staged slot of one entity kind and dispatches each
    /// drained action exactly once, in a fixed order: form submission,
    /// deletion, status update. Returns one outcome per dispatched action.
    pub async fn run_staged<R: Resource>(
        &self,
        store: &mut SessionStore<R>,
    ) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::new();

        if let Some(record) = store.drain_staged_form() {
            outcomes.push(self.submit_form(record).await);
        }
        if let Some(id) = store.drain_staged_deletion() {
            outcomes.push(self.delete::<R>(id).await);
        }
        if let Some(request) = store.drain_staged_status_update() {
            outcomes.push(self.update_status(request).await);
        }

        outcomes
    }

    /// Exactly one create-or-update call, decided by the presence of an id.
    pub async fn submit_form<R: Resource>(&self, record: R) -> ActionOutcome {
        let payload = match serde_json::to_value(&record) {
            Ok(payload) => payload,
            Err(err) => {
                return ActionOutcome::failure(format!(
                    "failed to encode {}: {err}",
                    R::SINGULAR
                ))
            }
        };

        match record.id() {
            Some(id) => match self.api.update_value(R::COLLECTION, id, payload).await {
                Ok(_) => {
                    info!(kind = R::SINGULAR, id, "record updated");
                    ActionOutcome::success(format!("{} updated successfully", R::SINGULAR))
                }
                Err(err) => {
                    warn!(kind = R::SINGULAR, id, %err, "update failed");
                    ActionOutcome::failure(format!("failed to update {}: {err}", R::SINGULAR))
                }
            },
            None => match self.api.create_value(R::COLLECTION, payload).await {
                Ok(_) => {
                    info!(kind = R::SINGULAR, "record created");
                    ActionOutcome::success(format!("{} created successfully", R::SINGULAR))
                }
                Err(err) => {
                    warn!(kind = R::SINGULAR, %err, "create failed");
                    ActionOutcome::failure(format!("failed to create {}: {err}", R::SINGULAR))
                }
            },
        }
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> ActionOutcome {
        match self.api.delete_value(R::COLLECTION, id).await {
            Ok(()) => {
                info!(kind = R::SINGULAR, id, "record deleted");
                ActionOutcome::success(format!("{} deleted successfully", R::SINGULAR))
            }
            Err(err) => {
                warn!(kind = R::SINGULAR, id, %err, "delete failed");
                ActionOutcome::failure(format!("failed to delete {}: {err}", R::SINGULAR))
            }
        }
    }

    pub async fn update_status(&self, request: StatusUpdateRequest) -> ActionOutcome {
        match self.api.apply_task_action(request).await {
            Ok(()) => {
                info!(task_id = request.task_id, action = %request.action, "task transitioned");
                ActionOutcome::success(match request.action {
                    shared::tasks::TaskAction::Start => "task started successfully",
                    shared::tasks::TaskAction::Complete => "task completed successfully",
                    shared::tasks::TaskAction::Cancel => "task cancelled successfully",
                })
            }
            Err(err) => {
                warn!(task_id = request.task_id, action = %request.action, %err, "transition failed");
                ActionOutcome::failure(format!(
                    "failed to {} task {}: {err}",
                    request.action, request.task_id
                ))
            }
        }
    }
}
