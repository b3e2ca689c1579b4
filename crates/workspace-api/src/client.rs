use crate::error::ClientError;
use async_trait::async_trait;
use provision_core::config::ApiConfig;
use provision_core::remote::{
    DatabaseRequest, Identity, RecordParent, RecordRequest, RemoteApi, RemoteError, RemoteId,
    SearchFilter,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const VERSION_HEADER: &str = "notion-version";

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_api_config(api: &ApiConfig, token: impl Into<String>) -> Self {
        Self {
            base_url: api.base_url.clone(),
            token: token.into(),
            api_version: api.api_version.clone(),
            timeout: api.timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bot: Option<BotInfo>,
}

#[derive(Debug, Deserialize)]
struct BotInfo {
    #[serde(default)]
    workspace_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CreatedResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn page_parent(page_id: Option<&str>) -> Value {
    match page_id {
        Some(id) => json!({ "type": "page_id", "page_id": id }),
        None => json!({ "type": "workspace", "workspace": true }),
    }
}

pub fn database_body(request: &DatabaseRequest) -> Value {
    let mut body = json!({
        "parent": page_parent(request.parent_page_id.as_deref()),
        "title": rich_text(&request.title),
        "properties": request.properties,
    });
    if let Some(description) = &request.description {
        body["description"] = rich_text(description);
    }
    body
}

pub fn page_body(request: &RecordRequest) -> Value {
    let parent = match &request.parent {
        Some(RecordParent::Database(id)) => json!({ "type": "database_id", "database_id": id }),
        Some(RecordParent::Page(id)) => page_parent(Some(id.as_str())),
        None => page_parent(None),
    };
    let mut body = json!({
        "parent": parent,
        "properties": request.properties,
    });
    if !request.children.is_empty() {
        let blocks: Vec<Value> = request
            .children
            .iter()
            .map(|text| {
                json!({
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": { "rich_text": rich_text(text) }
                })
            })
            .collect();
        body["children"] = Value::Array(blocks);
    }
    body
}

pub fn search_body(filter: &SearchFilter) -> Value {
    let mut body = json!({});
    if let Some(query) = &filter.query {
        body["query"] = json!(query);
    }
    if let Some(object) = filter.object {
        body["filter"] = json!({ "property": "object", "value": object });
    }
    body
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Map a non-success response onto the closed error set.
pub fn classify(status: StatusCode, retry_after: Option<Duration>, body: &str) -> RemoteError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) => match e.code {
            Some(code) => format!("{code}: {}", e.message),
            None => e.message,
        },
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.trim().to_string(),
    };
    match status.as_u16() {
        401 | 403 => RemoteError::Unauthorized(message),
        404 => RemoteError::NotFound(message),
        429 => RemoteError::RateLimited { retry_after },
        400..=499 => RemoteError::Rejected(message),
        _ => RemoteError::Internal(message),
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Internal(e.to_string())
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// WorkspaceClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WorkspaceClient {
    http: reqwest::Client,
    base_url: String,
}

impl WorkspaceClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| ClientError::InvalidHeader("authorization"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            VERSION_HEADER,
            HeaderValue::from_str(&config.api_version)
                .map_err(|_| ClientError::InvalidHeader(VERSION_HEADER))?,
        );

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RemoteError::Internal(format!("invalid response body: {e}")));
        }
        let wait = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        let err = classify(status, wait, &body);
        tracing::debug!(status = status.as_u16(), error = %err, "request failed");
        Err(err)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, RemoteError> {
        tracing::debug!(path, "POST");
        self.send(self.http.post(self.url(path)).json(body)).await
    }
}

#[async_trait]
impl RemoteApi for WorkspaceClient {
    async fn identity_probe(&self) -> Result<Identity, RemoteError> {
        let user: UserResponse = self.send(self.http.get(self.url("/v1/users/me"))).await?;
        Ok(Identity {
            id: user.id,
            name: user.name,
            workspace: user.bot.and_then(|b| b.workspace_name),
        })
    }

    async fn create_resource(&self, request: &DatabaseRequest) -> Result<RemoteId, RemoteError> {
        let created: CreatedResponse = self.post("/v1/databases", &database_body(request)).await?;
        Ok(RemoteId::new(created.id))
    }

    async fn create_record(&self, request: &RecordRequest) -> Result<RemoteId, RemoteError> {
        let created: CreatedResponse = self.post("/v1/pages", &page_body(request)).await?;
        Ok(RemoteId::new(created.id))
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<RemoteId>, RemoteError> {
        let found: SearchResponse = self.post("/v1/search", &search_body(filter)).await?;
        Ok(found
            .results
            .into_iter()
            .map(|r| RemoteId::new(r.id))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use provision_core::remote::SearchObject;
    use serde_json::Map;

    fn client(url: &str) -> WorkspaceClient {
        WorkspaceClient::new(ClientConfig {
            base_url: url.to_string(),
            token: "secret".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn database_request() -> DatabaseRequest {
        let mut properties = Map::new();
        properties.insert("Name".to_string(), json!({ "title": {} }));
        DatabaseRequest {
            parent_page_id: Some("parent-1".to_string()),
            title: "Projects".to_string(),
            description: None,
            properties,
        }
    }

    #[test]
    fn empty_token_rejected() {
        let err = WorkspaceClient::new(ClientConfig {
            base_url: "http://localhost".to_string(),
            token: "  ".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }

    #[test]
    fn classify_status_codes() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"bad property"}"#;
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, None, body),
            RemoteError::Rejected("validation_error: bad property".to_string())
        );
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, None, ""),
            RemoteError::Unauthorized(_)
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, None, ""),
            RemoteError::Unauthorized(_)
        ));
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, None, "missing"),
            RemoteError::NotFound(ref m) if m == "missing"
        ));
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(2)), ""),
            RemoteError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
        );
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, None, ""),
            RemoteError::Internal(_)
        ));
    }

    #[test]
    fn bodies() {
        let db = database_body(&database_request());
        assert_eq!(db["parent"]["page_id"], json!("parent-1"));
        assert_eq!(db["title"][0]["text"]["content"], json!("Projects"));
        assert!(db.get("description").is_none());

        let page = page_body(&RecordRequest {
            parent: Some(RecordParent::Database(RemoteId::new("db-1"))),
            properties: Map::new(),
            children: vec!["hello".to_string()],
        });
        assert_eq!(page["parent"]["database_id"], json!("db-1"));
        assert_eq!(page["children"][0]["type"], json!("paragraph"));

        let free = page_body(&RecordRequest {
            parent: None,
            properties: Map::new(),
            children: Vec::new(),
        });
        assert_eq!(free["parent"]["workspace"], json!(true));
        assert!(free.get("children").is_none());

        let search = search_body(&SearchFilter {
            query: Some("Projects".to_string()),
            object: Some(SearchObject::Database),
        });
        assert_eq!(search["filter"]["value"], json!("database"));
    }

    #[tokio::test]
    async fn identity_probe_sends_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/users/me")
            .match_header("authorization", "Bearer secret")
            .match_header("notion-version", "2022-06-28")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"user","id":"bot-1","name":"Provisioner","bot":{"workspace_name":"Acme"}}"#)
            .create_async()
            .await;

        let identity = client(&server.url()).identity_probe().await.unwrap();
        mock.assert_async().await;
        assert_eq!(identity.id, "bot-1");
        assert_eq!(identity.workspace.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn create_resource_posts_database() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/databases")
            .match_body(Matcher::PartialJson(json!({
                "parent": { "page_id": "parent-1" },
                "properties": { "Name": { "title": {} } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"database","id":"db-42"}"#)
            .create_async()
            .await;

        let id = client(&server.url())
            .create_resource(&database_request())
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(id, RemoteId::new("db-42"));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/pages")
            .with_status(429)
            .with_header("retry-after", "3")
            .with_body(r#"{"object":"error","status":429,"code":"rate_limited","message":"slow down"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .create_record(&RecordRequest {
                parent: None,
                properties: Map::new(),
                children: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RemoteError::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
    }

    #[tokio::test]
    async fn unauthorized_probe() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/users/me")
            .with_status(401)
            .with_body(r#"{"object":"error","status":401,"code":"unauthorized","message":"API token is invalid."}"#)
            .create_async()
            .await;

        let err = client(&server.url()).identity_probe().await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::Unauthorized("unauthorized: API token is invalid.".to_string())
        );
    }

    #[tokio::test]
    async fn search_collects_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/search")
            .match_body(Matcher::PartialJson(json!({ "query": "Clients" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"object":"list","results":[{"id":"a"},{"id":"b"}],"has_more":false}"#)
            .create_async()
            .await;

        let ids = client(&server.url())
            .search(&SearchFilter {
                query: Some("Clients".to_string()),
                object: None,
            })
            .await
            .unwrap();
        assert_eq!(ids, [RemoteId::new("a"), RemoteId::new("b")]);
    }

    #[tokio::test]
    async fn server_error_is_internal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/databases")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server.url())
            .create_resource(&database_request())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Internal(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_internal() {
        let err = client("http://127.0.0.1:1")
            .identity_probe()
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Internal(_) | RemoteError::Timeout));
    }
}
