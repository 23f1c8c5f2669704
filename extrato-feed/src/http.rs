//! JSON-over-HTTP collaborator.
//!
//! Routes, relative to the configured base URL:
//! - `GET /accounts/{id}/statement?period=&page=&limit=&search=`
//! - `GET /credit-cards/{id}/bills?period=&page=&limit=&search=`
//! - `GET /accounts/{id}`, `GET /accounts` (and the `/credit-cards` equivalents)
//!
//! No retries or caching here. Timeouts are whatever the `reqwest::Client`
//! passed to [`HttpSource::with_client`] is configured with.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use extrato_core::{PageRequest, RawPage, SubjectKind};
use extrato_ingest::decode_page;

use crate::error::SourceError;
use crate::source::{PageSource, Subject, SubjectSource};

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

// Subject as the API sends it; `kind` is implied by the route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSubject {
    id: String,
    #[serde(alias = "title", default)]
    name: String,
    #[serde(default)]
    institution: Option<String>,
    #[serde(alias = "limit", default)]
    credit_limit: Option<f64>,
    #[serde(default)]
    color: Option<String>,
}

impl WireSubject {
    fn into_subject(self, kind: SubjectKind) -> Subject {
        Subject {
            id: self.id,
            name: self.name,
            kind,
            institution: self.institution,
            credit_limit: self.credit_limit,
            color: self.color,
        }
    }
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection(kind: SubjectKind) -> &'static str {
        match kind {
            SubjectKind::Statement => "accounts",
            SubjectKind::Bill => "credit-cards",
        }
    }

    pub(crate) fn page_url(&self, request: &PageRequest) -> String {
        let ctx = &request.context;
        let leaf = match ctx.kind {
            SubjectKind::Statement => "statement",
            SubjectKind::Bill => "bills",
        };
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            Self::collection(ctx.kind),
            ctx.subject_id,
            leaf
        )
    }

    pub(crate) fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("period", request.context.period.to_string()),
            ("page", request.page.to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(search) = &request.context.search {
            query.push(("search", search.clone()));
        }
        query
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, SourceError> {
        let mut req = self.client.get(url).query(query);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        debug!(url, "GET");
        let resp = req.send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

impl PageSource for HttpSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, SourceError> {
        let url = self.page_url(request);
        let body = self.get_json(&url, &Self::page_query(request)).await?;
        Ok(decode_page(request.context.kind, &body))
    }
}

impl SubjectSource for HttpSource {
    async fn subject(&self, kind: SubjectKind, id: &str) -> Result<Subject, SourceError> {
        let url = format!("{}/{}/{}", self.base_url, Self::collection(kind), id);
        let body = unwrap_data(self.get_json(&url, &[]).await?);
        let wire: WireSubject =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(wire.into_subject(kind))
    }

    async fn subjects(&self, kind: SubjectKind) -> Result<Vec<Subject>, SourceError> {
        let url = format!("{}/{}", self.base_url, Self::collection(kind));
        let body = unwrap_data(self.get_json(&url, &[]).await?);
        let wire: Vec<WireSubject> =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(wire.into_iter().map(|w| w.into_subject(kind)).collect())
    }
}
