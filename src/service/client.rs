use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use super::types::{ReviewRequest, ServiceResponse};
use crate::config::ServiceConfig;

const USER_AGENT: &str = concat!("smarteditor-action/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request to {service} endpoint timed out")]
    Timeout { service: String },
    #[error("{service} endpoint returned {status}: {body}")]
    Status {
        service: String,
        status: StatusCode,
        body: String,
    },
    #[error("Request to {service} endpoint failed: {source}")]
    Transport {
        service: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected response from {service} endpoint: {source}")]
    Decode {
        service: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A remote service that proposes rewrites for a document
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn review(&self, path: &str, text: &str) -> Result<ServiceResponse, ServiceError>;
}

/// Suggestion service reached over HTTP
pub struct HttpSuggestionService {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    label: String,
}

impl HttpSuggestionService {
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            label: config.service.label(),
        })
    }

    fn transport_error(&self, source: reqwest::Error) -> ServiceError {
        if source.is_timeout() {
            ServiceError::Timeout {
                service: self.label.clone(),
            }
        } else {
            ServiceError::Transport {
                service: self.label.clone(),
                source,
            }
        }
    }
}

#[async_trait]
impl SuggestionService for HttpSuggestionService {
    #[instrument(skip(self, text), fields(service = %self.label))]
    async fn review(&self, path: &str, text: &str) -> Result<ServiceResponse, ServiceError> {
        info!("Sending {} bytes to {} endpoint", text.len(), self.label);

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&ReviewRequest { text });
        if let Some(token) = &self.token {
            request = request.header("X-API-Token", token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                service: self.label.clone(),
                status,
                body,
            });
        }

        let parsed: ServiceResponse =
            serde_json::from_str(&body).map_err(|source| ServiceError::Decode {
                service: self.label.clone(),
                source,
            })?;

        debug!(
            violations = parsed.violations.len(),
            run_url = parsed.run_url.as_deref().unwrap_or(""),
            "Received response"
        );

        Ok(parsed)
    }
}
