use anyhow::{anyhow, Context};
use gau_alloc::{
    AllocationStore, CategoryResult, CategorySearch, DisbursementRecord, RowSubmission,
    StoreError,
};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Remote record service.
///
/// Routes, relative to `base_url`:
/// - `GET  disbursements/{id}` → [`DisbursementRecord`]
/// - `PUT  disbursements/{id}/allocations` with `{"allocations": [...]}`
/// - `GET  gaus?term=..&exclude=a,b` → `[CategoryResult]`
///
/// The bearer token is passed in by the caller; do not log it.
#[derive(Debug, Clone)]
pub struct HttpAllocationStore {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

#[derive(Serialize)]
struct SaveBody<'a> {
    allocations: &'a [RowSubmission],
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpAllocationStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Server(format!("invalid store base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Server("store base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }
}

/// Map a non-2xx response to a [`StoreError`]. The body's `message` is
/// preferred; otherwise the status line is used.
async fn error_from_response(disbursement_id: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("store http error status={}", status.as_u16()));

    warn!(status = status.as_u16(), %message, "store request failed");
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            disbursement_id: disbursement_id.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AccessDenied {
            disbursement_id: disbursement_id.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(message)
        }
        _ => StoreError::Server(message),
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Server(format!("store request failed: {e}"))
}

#[async_trait::async_trait]
impl AllocationStore for HttpAllocationStore {
    async fn get(&self, disbursement_id: &str) -> Result<DisbursementRecord, StoreError> {
        let url = self.endpoint(&["disbursements", disbursement_id])?;
        debug!(%url, "store get");
        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(error_from_response(disbursement_id, resp).await);
        }
        resp.json::<DisbursementRecord>()
            .await
            .map_err(|e| StoreError::Server(format!("store response json decode failed: {e}")))
    }

    async fn save(&self, disbursement_id: &str, rows: &[RowSubmission]) -> Result<(), StoreError> {
        let url = self.endpoint(&["disbursements", disbursement_id, "allocations"])?;
        debug!(%url, rows = rows.len(), "store save");
        let resp = self
            .authorize(self.http.put(url))
            .json(&SaveBody { allocations: rows })
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(error_from_response(disbursement_id, resp).await);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CategorySearch for HttpAllocationStore {
    async fn search(
        &self,
        term: &str,
        excluded_ids: &[String],
    ) -> anyhow::Result<Vec<CategoryResult>> {
        let url = self.endpoint(&["gaus"]).map_err(|e| anyhow!("{e}"))?;
        let exclude = excluded_ids.join(",");
        let resp = self
            .authorize(self.http.get(url))
            .query(&[("term", term), ("exclude", exclude.as_str())])
            .send()
            .await
            .context("gau search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body: ErrorBody = resp.json().await.unwrap_or_default();
            return Err(anyhow!(
                "gau search http error status={} message={}",
                status.as_u16(),
                body.message.unwrap_or_else(|| "unknown".to_string())
            ));
        }
        resp.json()
            .await
            .context("gau search response json decode failed")
    }
}
