use std::time::Duration;

use async_trait::async_trait;
use dealboard_common::{Deal, DealId, DealPage, NewDeal, Stage};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::{DealApi, DealQuery, Session};
use crate::errors::ClientError;
use crate::merge::{MergeOutcome, MergePreview, MergeSelection};

const USER_AGENT: &str = concat!("dealboard/", env!("CARGO_PKG_VERSION"));

/// `DealApi` over the backend's JSON REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpDealApi {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

#[derive(Serialize)]
struct MoveStageRequest {
    stage: Stage,
}

#[derive(Serialize)]
struct MergeRequest<'a> {
    #[serde(flatten)]
    selection: &'a MergeSelection,
    dry_run: bool,
}

impl HttpDealApi {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, ClientError> {
        // A trailing slash makes `Url::join` append instead of replacing the
        // last path segment.
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|_| ClientError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ClientError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
            })
    }

    /// Base URL plus path segments, each percent-encoded on its own so an
    /// opaque id cannot add segments.
    fn endpoint_segments(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(path)?;
        Ok(self.request_url(method, url))
    }

    fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%method, %url, %request_id, "backend request");
        let mut builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json")
            .header("X-Request-Id", request_id.to_string());
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send and return the raw body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, ClientError> {
        let resp = builder.send().await.map_err(ClientError::Transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(ClientError::Transport)?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send(builder).await?;
        serde_json::from_str(&body).map_err(ClientError::Decode)
    }
}

/// Pull a readable message out of an error response. Backends answer with
/// `{"error": ..}`, `{"message": ..}`, `{"detail": ..}` or plain text.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl DealApi for HttpDealApi {
    async fn list_deals(&self, query: &DealQuery) -> Result<DealPage, ClientError> {
        let builder = self.request(Method::GET, "crm/deals")?.query(&[
            ("status", query.status.clone()),
            ("page_size", query.page_size.to_string()),
        ]);
        self.send_json(builder).await
    }

    async fn create_deal(&self, deal: &NewDeal) -> Result<Deal, ClientError> {
        let builder = self.request(Method::POST, "crm/deals")?.json(deal);
        self.send_json(builder).await
    }

    async fn move_deal(&self, id: &DealId, stage: Stage) -> Result<(), ClientError> {
        let url = self.endpoint_segments(&["crm", "deals", id.as_str(), "stage"])?;
        let builder = self
            .request_url(Method::PATCH, url)
            .json(&MoveStageRequest { stage });
        self.send(builder).await?;
        Ok(())
    }

    async fn preview_merge(&self, selection: &MergeSelection) -> Result<MergePreview, ClientError> {
        let builder = self
            .request(Method::POST, "crm/customers/merge")?
            .json(&MergeRequest {
                selection,
                dry_run: true,
            });
        self.send_json(builder).await
    }

    async fn commit_merge(&self, selection: &MergeSelection) -> Result<MergeOutcome, ClientError> {
        let builder = self
            .request(Method::POST, "crm/customers/merge")?
            .json(&MergeRequest {
                selection,
                dry_run: false,
            });
        self.send_json(builder).await
    }
}
