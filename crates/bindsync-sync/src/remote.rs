//! Remote store client
//!
//! [`RemoteStore`] is the seam the indexer, executor and backfill talk to.
//! [`RemoteClient`] implements it over the hosted database's JSON API;
//! tests substitute in-memory stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bindsync_config::SyncConfig;
use bindsync_http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use bindsync_http::{HttpClient, HttpClientTrait, HttpConfig};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::RemoteError;

const VERSION_HEADER: &str = "notion-version";

/// One row of the remote table, properties still in wire shape
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage {
    pub id: String,
    pub properties: Map<String, Value>,
    pub last_edited_time: Option<String>,
}

impl RemotePage {
    pub fn from_value(value: &Value) -> Result<Self, RemoteError> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::Malformed("page without id".to_string()))?;
        Ok(RemotePage {
            id: id.to_string(),
            properties: value
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            last_edited_time: value
                .get("last_edited_time")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Result of a full listing; `error` is set when pagination broke off
#[derive(Debug, Default)]
pub struct ListResult {
    pub rows: Vec<RemotePage>,
    pub error: Option<RemoteError>,
}

impl ListResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Token owner as reported by the remote
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUser {
    pub id: String,
    pub name: Option<String>,
    pub kind: Option<String>,
}

/// Database title and its column label -> column type map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseSchema {
    pub id: String,
    pub title: String,
    pub properties: BTreeMap<String, String>,
}

/// Operations the sync core needs from the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Check the credential
    async fn whoami(&self) -> Result<RemoteUser, RemoteError>;

    /// Fetch the database schema
    async fn describe(&self, database_id: &str) -> Result<DatabaseSchema, RemoteError>;

    /// Fetch every row, following the cursor until the remote says there is no more
    async fn list_all(&self, database_id: &str) -> ListResult;

    /// Create a row and return its id
    async fn create(&self, database_id: &str, properties: Value) -> Result<String, RemoteError>;

    /// Patch a row's properties and return its id
    async fn update(&self, page_id: &str, properties: Value) -> Result<String, RemoteError>;
}

/// HTTP implementation of [`RemoteStore`]
pub struct RemoteClient {
    http: Arc<dyn HttpClientTrait>,
    api_base: Url,
    page_size: u32,
}

impl RemoteClient {
    /// Build the authenticated client from a validated configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self, RemoteError> {
        let token = config
            .remote
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(RemoteError::Auth(401))?;

        let headers = api_headers(token, &config.remote.api_version)?;
        let http_settings = &config.http;
        let mut http_config = HttpConfig::default()
            .with_timeout(http_settings.timeout())
            .with_max_attempts(http_settings.max_attempts)
            .with_retry_delay(http_settings.retry_base_delay())
            .with_pacing(http_settings.pacing());
        if let Some(proxy) = &http_settings.proxy {
            http_config = http_config.with_proxy(proxy.clone());
        }

        let http = HttpClient::with_headers(http_config, headers)?;
        Self::with_http(Arc::new(http), &config.remote.api_base, config.remote.page_size)
    }

    /// Use an existing HTTP client (already carrying auth headers)
    pub fn with_http(
        http: Arc<dyn HttpClientTrait>,
        api_base: &str,
        page_size: u32,
    ) -> Result<Self, RemoteError> {
        let api_base =
            Url::parse(api_base).map_err(|e| RemoteError::Endpoint(format!("{}: {}", api_base, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(RemoteError::Endpoint(api_base.to_string()));
        }
        Ok(Self {
            http,
            api_base,
            page_size: page_size.clamp(1, 100),
        })
    }

    /// `api_base` with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<String, RemoteError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Endpoint(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    async fn query_page(
        &self,
        url: &str,
        cursor: Option<&str>,
    ) -> Result<(Vec<RemotePage>, Option<String>), RemoteError> {
        let mut body = json!({ "page_size": self.page_size });
        if let Some(cursor) = cursor {
            body["start_cursor"] = Value::String(cursor.to_string());
        }

        let response = self.http.post_json(url, &body).await?;
        let results = response
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| RemoteError::Malformed("query response without results".to_string()))?;
        let pages = results
            .iter()
            .map(RemotePage::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let has_more = response
            .get("has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let next = response
            .get("next_cursor")
            .and_then(Value::as_str)
            .filter(|c| has_more && !c.is_empty())
            .map(str::to_string);
        if has_more && next.is_none() {
            return Err(RemoteError::Malformed(
                "has_more without next_cursor".to_string(),
            ));
        }
        Ok((pages, next))
    }
}

/// Bearer auth, protocol version and JSON content type
pub fn api_headers(token: &str, api_version: &str) -> Result<HeaderMap, RemoteError> {
    let invalid = |e: bindsync_http::header::InvalidHeaderValue| {
        RemoteError::Http(bindsync_http::HttpError::InvalidHeader(e.to_string()))
    };

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(invalid)?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        HeaderName::from_static(VERSION_HEADER),
        HeaderValue::from_str(api_version).map_err(invalid)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn returned_id(response: &Value) -> Result<String, RemoteError> {
    response
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RemoteError::Malformed("response without id".to_string()))
}

fn plain_text(rich_text: Option<&Value>) -> String {
    rich_text
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RemoteStore for RemoteClient {
    async fn whoami(&self) -> Result<RemoteUser, RemoteError> {
        let response = self.http.get_json(&self.endpoint(&["users", "me"])?).await?;
        let id = returned_id(&response)?;
        let name = response
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        let kind = response
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        info!(user = %id, "Authenticated");
        Ok(RemoteUser { id, name, kind })
    }

    async fn describe(&self, database_id: &str) -> Result<DatabaseSchema, RemoteError> {
        let response = self
            .http
            .get_json(&self.endpoint(&["databases", database_id])?)
            .await?;

        let properties = response
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(label, prop)| {
                        let kind = prop
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown")
                            .to_string();
                        (label.clone(), kind)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(DatabaseSchema {
            id: returned_id(&response).unwrap_or_else(|_| database_id.to_string()),
            title: plain_text(response.get("title")),
            properties,
        })
    }

    async fn list_all(&self, database_id: &str) -> ListResult {
        let url = match self.endpoint(&["databases", database_id, "query"]) {
            Ok(url) => url,
            Err(e) => {
                return ListResult {
                    rows: Vec::new(),
                    error: Some(e),
                }
            }
        };

        let mut result = ListResult::default();
        let mut cursor: Option<String> = None;
        loop {
            match self.query_page(&url, cursor.as_deref()).await {
                Ok((pages, next)) => {
                    debug!(count = pages.len(), "Fetched query page");
                    result.rows.extend(pages);
                    match next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Err(e) => {
                    warn!(fetched = result.rows.len(), "Pagination failed: {}", e);
                    result.error = Some(e);
                    break;
                }
            }
        }
        result
    }

    async fn create(&self, database_id: &str, properties: Value) -> Result<String, RemoteError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        let response = self.http.post_json(&self.endpoint(&["pages"])?, &body).await?;
        returned_id(&response)
    }

    async fn update(&self, page_id: &str, properties: Value) -> Result<String, RemoteError> {
        let body = json!({ "properties": properties });
        let response = self
            .http
            .patch_json(&self.endpoint(&["pages", page_id])?, &body)
            .await?;
        Ok(returned_id(&response).unwrap_or_else(|_| page_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RemoteClient {
        let http = HttpClient::new(HttpConfig::fast()).unwrap();
        RemoteClient::with_http(Arc::new(http), base, 100).unwrap()
    }

    #[test]
    fn test_endpoint_joining() {
        let c = client("https://api.example.com/v1");
        assert_eq!(
            c.endpoint(&["databases", "abc", "query"]).unwrap(),
            "https://api.example.com/v1/databases/abc/query"
        );

        let c = client("https://api.example.com/v1/");
        assert_eq!(c.endpoint(&["pages"]).unwrap(), "https://api.example.com/v1/pages");
    }

    #[test]
    fn test_invalid_base() {
        let http = HttpClient::new(HttpConfig::fast()).unwrap();
        assert!(matches!(
            RemoteClient::with_http(Arc::new(http), "not a url", 100),
            Err(RemoteError::Endpoint(_))
        ));
    }

    #[test]
    fn test_headers() {
        let headers = api_headers("secret", "2022-06-28").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer secret");
        assert_eq!(headers[VERSION_HEADER], "2022-06-28");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_page_from_value() {
        let page = RemotePage::from_value(&json!({
            "id": "p1",
            "last_edited_time": "2024-01-01T00:00:00.000Z",
            "properties": { "Name": { "type": "title", "title": [] } }
        }))
        .unwrap();
        assert_eq!(page.id, "p1");
        assert!(page.properties.contains_key("Name"));

        assert!(RemotePage::from_value(&json!({ "properties": {} })).is_err());
    }

    #[test]
    fn test_missing_token_is_auth_error() {
        let config = SyncConfig::default();
        assert!(matches!(
            RemoteClient::from_config(&config),
            Err(RemoteError::Auth(_))
        ));
    }
}
