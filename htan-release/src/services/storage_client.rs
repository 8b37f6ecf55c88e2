//! Storage REST client
//!
//! Lists container children through the storage backend's REST API
//! (`POST {endpoint}/entity/children`), following `nextPageToken` until the
//! listing is exhausted. No retry policy is applied here.

use super::children::{ChildEntry, ChildrenLookup, EntryKind};
use crate::error::{ReleaseError, ReleaseResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("htan-release/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Storage client errors
#[derive(Debug, Error)]
pub enum StorageClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Container not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<StorageClientError> for ReleaseError {
    fn from(err: StorageClientError) -> Self {
        ReleaseError::Storage(err.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChildrenRequest<'a> {
    parent_id: &'a str,
    include_types: [&'static str; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildrenPage {
    #[serde(default)]
    page: Vec<ChildHeader>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChildHeader {
    name: String,
    id: String,
    #[serde(rename = "type", default)]
    entity_type: String,
}

/// REST children lookup
pub struct StorageClient {
    http_client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl StorageClient {
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Result<Self, StorageClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// Build from an endpoint and the name of the env var holding the token
    pub fn from_env(endpoint: &str, token_env: Option<&str>) -> Result<Self, StorageClientError> {
        let token = token_env.and_then(|name| std::env::var(name).ok()).filter(|t| !t.is_empty());
        if token_env.is_some() && token.is_none() {
            tracing::warn!("Storage auth token variable is unset, requests are anonymous");
        }
        Self::new(endpoint, token)
    }

    async fn fetch_page(
        &self,
        parent_id: &str,
        next_page_token: Option<String>,
    ) -> Result<ChildrenPage, StorageClientError> {
        let url = format!("{}/entity/children", self.endpoint);
        let body = ChildrenRequest {
            parent_id,
            include_types: ["folder", "file"],
            next_page_token,
        };

        tracing::debug!(parent_id = %parent_id, url = %url, "Listing children");

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StorageClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 404 {
            return Err(StorageClientError::NotFound(parent_id.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageClientError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| StorageClientError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ChildrenLookup for StorageClient {
    async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
        let mut entries = Vec::new();
        let mut token = None;
        loop {
            let page = self.fetch_page(parent_id, token).await?;
            entries.extend(page.page.into_iter().map(|h| ChildEntry {
                kind: EntryKind::parse(&h.entity_type),
                name: h.name,
                id: h.id,
            }));
            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(entries)
    }
}
