//! HTTP access to the scoreboard service.
//!
//! Each operation is one round-trip with no retries. Bodies are decoded into
//! the typed envelopes from `shared::protocol` so malformed payloads stop at
//! this boundary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{SolveRecord, SolverEntry, Task, TaskId},
    protocol::{CatalogResponse, SolversResponse, SolvesResponse, SubmitForm, SubmitResponse},
};
use tracing::debug;
use url::Url;

use crate::error::{BoardError, BoardResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_catalog(&self) -> BoardResult<Vec<Task>>;
    async fn fetch_solves(&self) -> BoardResult<Vec<SolveRecord>>;
    async fn fetch_solvers(&self, task_id: TaskId) -> BoardResult<Vec<SolverEntry>>;
    async fn submit_attempt(
        &self,
        task_id: TaskId,
        key: &str,
        nonce: &str,
    ) -> BoardResult<SubmitResponse>;
}

pub struct RemoteCatalogClient {
    http: Client,
    base: Url,
}

impl RemoteCatalogClient {
    pub fn new(server_url: &str) -> BoardResult<Self> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> BoardResult<Self> {
        let base = parse_base_url(server_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BoardError::ClientBuild { source })?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> BoardResult<Url> {
        self.base
            .join(path)
            .map_err(|err| BoardError::InvalidServerUrl {
                url: format!("{}{path}", self.base),
                reason: err.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BoardResult<T> {
        let url = self.endpoint(path)?;
        let endpoint = format!("GET /{path}");
        debug!(%url, "board: fetching");
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|source| BoardError::Network {
                endpoint: endpoint.clone(),
                source,
            })?
            .bytes()
            .await
            .map_err(|source| BoardError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        decode(&endpoint, &bytes)
    }
}

#[async_trait]
impl CatalogService for RemoteCatalogClient {
    async fn fetch_catalog(&self) -> BoardResult<Vec<Task>> {
        let body: CatalogResponse = self.get_json("chals").await?;
        Ok(body.game)
    }

    async fn fetch_solves(&self) -> BoardResult<Vec<SolveRecord>> {
        let body: SolvesResponse = self.get_json("solves").await?;
        Ok(body.solves)
    }

    async fn fetch_solvers(&self, task_id: TaskId) -> BoardResult<Vec<SolverEntry>> {
        let body: SolversResponse = self.get_json(&format!("chal/{task_id}/solves")).await?;
        Ok(body.teams)
    }

    async fn submit_attempt(
        &self,
        task_id: TaskId,
        key: &str,
        nonce: &str,
    ) -> BoardResult<SubmitResponse> {
        let path = format!("chal/{task_id}");
        let url = self.endpoint(&path)?;
        let endpoint = format!("POST /{path}");
        debug!(%url, task_id = task_id.0, "board: submitting attempt");
        let bytes = self
            .http
            .post(url)
            .form(&SubmitForm {
                nonce: nonce.to_string(),
                key: key.to_string(),
            })
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|source| BoardError::Network {
                endpoint: endpoint.clone(),
                source,
            })?
            .bytes()
            .await
            .map_err(|source| BoardError::Network {
                endpoint: endpoint.clone(),
                source,
            })?;
        decode(&endpoint, &bytes)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, bytes: &[u8]) -> BoardResult<T> {
    serde_json::from_slice(bytes).map_err(|source| BoardError::UnexpectedResponseShape {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Parses the service root. A trailing slash is added so relative endpoint
/// joins keep any path prefix the board is mounted under.
fn parse_base_url(raw: &str) -> BoardResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|err| BoardError::InvalidServerUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BoardError::InvalidServerUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
