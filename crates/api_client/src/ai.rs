//! Client for the AI assistant endpoints.
//!
//! These calls are slow by nature, so they run on their own reqwest client
//! with a longer read budget than the CRUD paths. Health probing never
//! errors; it folds every failure into an unhealthy report.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use shared::error::ApiError;
use tracing::{debug, warn};

use crate::config::Settings;

/// Questions below this length get the shorter read timeout; longer ones
/// are assumed to need a fuller answer.
const SHORT_QUESTION_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct AiHealth {
    pub healthy: bool,
    pub status: String,
    pub detail: Option<Value>,
    pub error: Option<String>,
}

impl AiHealth {
    fn unreachable(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            status: "error".into(),
            detail: None,
            error: Some(error.into()),
        }
    }
}

pub struct AiClient {
    http: Client,
    base_url: String,
    read_timeout: Duration,
    short_timeout: Duration,
    health_timeout: Duration,
    warmup_timeout: Duration,
}

impl AiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(settings.ai_connect_timeout_secs))
            .build()
            .context("failed to build ai http client")?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            read_timeout: Duration::from_secs(settings.ai_read_timeout_secs),
            short_timeout: Duration::from_secs(settings.ai_short_timeout_secs),
            health_timeout: Duration::from_secs(settings.ai_health_timeout_secs),
            warmup_timeout: Duration::from_secs(settings.ai_warmup_timeout_secs),
        })
    }

    /// Liveness plus readiness detail. Transport failures and non-200
    /// answers fold into an unhealthy report instead of propagating.
    pub async fn health(&self) -> AiHealth {
        let url = format!("{}/ai/health", self.base_url);
        let response = match self.http.get(url).timeout(self.health_timeout).send().await {
            Ok(response) => response,
            Err(err) => return AiHealth::unreachable(err.to_string()),
        };

        if response.status().as_u16() != 200 {
            return AiHealth {
                healthy: false,
                status: "unhealthy".into(),
                detail: None,
                error: Some(format!("HTTP {}", response.status().as_u16())),
            };
        }

        match response.json::<Value>().await {
            Ok(body) => {
                let status = body
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                AiHealth {
                    healthy: status == "healthy",
                    status,
                    detail: Some(body),
                    error: None,
                }
            }
            Err(err) => AiHealth::unreachable(err.to_string()),
        }
    }

    /// Forces model warmup; true once the backend reports itself ready.
    pub async fn warmup(&self) -> bool {
        let url = format!("{}/ai/health", self.base_url);
        let response = match self.http.post(url).timeout(self.warmup_timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "ai warmup request failed");
                return false;
            }
        };
        if response.status().as_u16() != 200 {
            return false;
        }
        response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("status")
                    .map(|status| status == &Value::String("ready".into()))
            })
            .unwrap_or(false)
    }

    /// Simple Q&A. Short questions get the short timeout; a long question
    /// that times out is retried once with the full budget before the
    /// failure surfaces.
    pub async fn ask(&self, question: &str, model: Option<&str>) -> Result<String, ApiError> {
        let short = question.chars().count() < SHORT_QUESTION_MAX_CHARS;
        let timeout = if short {
            self.short_timeout
        } else {
            self.read_timeout
        };

        match self.post_question("ai/answer", question, model, timeout).await {
            Ok(answer) => Ok(answer),
            Err(err) if !short && is_timeout(&err) => {
                debug!("long question timed out; retrying once with the full budget");
                self.post_question("ai/answer", question, model, self.read_timeout)
                    .await
                    .map_err(|retry_err| {
                        if is_timeout(&retry_err) {
                            ApiError::Transport(
                                "the question looks too complex for the simple mode; \
                                 rephrase it or use the advanced mode"
                                    .into(),
                            )
                        } else {
                            retry_err
                        }
                    })
            }
            Err(err) => Err(err),
        }
    }

    /// Complex Q&A with the full read budget and no automatic retry.
    pub async fn ask_advanced(
        &self,
        question: &str,
        model: Option<&str>,
    ) -> Result<String, ApiError> {
        self.post_question("ai/answer-advanced", question, model, self.read_timeout)
            .await
    }

    async fn post_question(
        &self,
        endpoint: &str,
        question: &str,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<String, ApiError> {
        let mut payload = json!({ "question": question });
        if let Some(model) = model {
            payload["model"] = Value::String(model.to_string());
        }

        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ApiError::Transport("timeout: the request took too long to answer".into())
                } else {
                    ApiError::Transport(err.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::status(status, body.trim().to_string()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(body
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

fn is_timeout(err: &ApiError) -> bool {
    err.is_transport() && err.to_string().to_ascii_lowercase().contains("timeout")
}
