//! API client for the fleet-management REST backend.
//!
//! Every call goes through [`ApiClient::execute`], which attaches the stored
//! bearer token and handles an expired access token: a 401 triggers one
//! refresh and one replay of the original request. When the refresh itself
//! fails the stored session is cleared and the call ends in
//! [`ApiError::SessionExpired`], which the shell turns into a redirect to the
//! login page.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{Session, SharedTokenStore};
use crate::config::Config;
use crate::models::{Activity, DashboardStats, Record, Resource};

use super::{ApiError, RequestAuthenticator};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

const DASHBOARD_STATS_PATH: &str = "/api/dashboard/stats/";
const DASHBOARD_ACTIVITIES_PATH: &str = "/api/dashboard/activities/";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    /// Present on login, and on refresh when the server rotates refresh tokens
    #[serde(default)]
    refresh: Option<String>,
}

/// Collections come back either as a bare array or as a paginated page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paged { results } => results,
        }
    }
}

/// A request as the caller described it, before authentication is applied.
///
/// Kept around so it can be sent a second time after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            method,
            url: url.into(),
            headers,
            body: None,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A request in flight, plus whether it has already been replayed.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub request: ApiRequest,
    pub retried: bool,
}

impl PendingRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }
}

/// API client for the fleet backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling,
/// and clones share the token store.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token_path: String,
    refresh_path: String,
    store: SharedTokenStore,
    authenticator: RequestAuthenticator,
}

impl ApiClient {
    /// Create a client for the configured backend, reading and writing
    /// tokens through `store`.
    pub fn new(config: &Config, store: SharedTokenStore) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            token_path: config.token_path.clone(),
            refresh_path: config.refresh_path.clone(),
            authenticator: RequestAuthenticator::new(store.clone()),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SharedTokenStore {
        &self.store
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ===== Session =====

    /// Exchange credentials for a token pair and store it.
    ///
    /// Rejected credentials come back as `Unauthorized` (401) or
    /// `Validation` (400), never as `SessionExpired`.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        let url = self.endpoint(&self.token_path);
        debug!(url = %url, username = username, "Requesting token pair");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let tokens: TokenResponse = Self::parse_json(response, &url).await?;
        let refresh = tokens.refresh.ok_or_else(|| {
            ApiError::InvalidResponse("Token response has no refresh token".to_string())
        })?;
        self.store.set(Session::new(tokens.access, refresh));

        info!(username = username, "Logged in");
        Ok(())
    }

    /// Drop the stored session.
    pub fn logout(&self) {
        self.store.clear();
        info!("Logged out");
    }

    /// Trade the stored refresh token for a new access token.
    ///
    /// Sent without a bearer header. Only the access token is replaced
    /// unless the server also returns a rotated refresh token.
    pub async fn refresh_access_token(&self) -> ApiResult<()> {
        let refresh_token = self
            .store
            .get()
            .map(|s| s.refresh_token)
            .ok_or(ApiError::MissingRefreshToken)?;

        let url = self.endpoint(&self.refresh_path);
        debug!(url = %url, "Refreshing access token");

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest {
                refresh: &refresh_token,
            })
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let tokens: TokenResponse = Self::parse_json(response, &url).await?;
        match tokens.refresh {
            Some(rotated) => self.store.set(Session::new(tokens.access, rotated)),
            None => self.store.set_access_token(tokens.access),
        }

        info!("Access token refreshed");
        Ok(())
    }

    // ===== Request pipeline =====

    async fn send(&self, request: &ApiRequest) -> ApiResult<Response> {
        let mut headers = request.headers.clone();
        self.authenticator.apply(&mut headers);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.url, "Sending request");
        Ok(builder.send().await?)
    }

    /// Send a request, refreshing the access token and replaying the request
    /// once if the server answers 401.
    ///
    /// A second 401 is returned as `Unauthorized` without another refresh.
    /// If the refresh fails the store is cleared and `SessionExpired` is
    /// returned. Other failures pass through unchanged.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<Response> {
        let mut pending = PendingRequest::new(request);

        loop {
            let response = self.send(&pending.request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::check_response(response).await;
            }

            if pending.retried {
                warn!(url = %pending.request.url, "Request rejected again after token refresh");
                return Err(ApiError::Unauthorized);
            }
            pending.retried = true;

            debug!(url = %pending.request.url, "Access token rejected, refreshing");
            if let Err(e) = self.refresh_access_token().await {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.store.clear();
                return Err(ApiError::SessionExpired(Box::new(e)));
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path);
        let response = self.execute(ApiRequest::new(Method::GET, url.clone())).await?;
        Self::parse_json(response, &url).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.endpoint(path);
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request: {}", e)))?;
        let response = self
            .execute(ApiRequest::new(method, url.clone()).with_json(body))
            .await?;
        Self::parse_json(response, &url).await
    }

    // ===== Resources =====

    /// Fetch every record of a collection
    pub async fn list<R: Record>(&self) -> ApiResult<Vec<R>> {
        let items: ListResponse<R> = self.get(&R::RESOURCE.collection_path()).await?;
        let items = items.into_vec();
        debug!(resource = %R::RESOURCE, count = items.len(), "Fetched records");
        Ok(items)
    }

    pub async fn fetch<R: Record>(&self, id: i64) -> ApiResult<R> {
        self.get(&R::RESOURCE.item_path(id)).await
    }

    /// Create a record, returning the server's copy (with its id)
    pub async fn create<R: Record>(&self, record: &R) -> ApiResult<R> {
        self.send_json(Method::POST, &R::RESOURCE.collection_path(), record)
            .await
    }

    /// Replace a record by id
    pub async fn update<R: Record>(&self, id: i64, record: &R) -> ApiResult<R> {
        self.send_json(Method::PUT, &R::RESOURCE.item_path(id), record)
            .await
    }

    pub async fn delete(&self, resource: Resource, id: i64) -> ApiResult<()> {
        let url = self.endpoint(&resource.item_path(id));
        self.execute(ApiRequest::new(Method::DELETE, url)).await?;
        info!(resource = %resource, id = id, "Deleted record");
        Ok(())
    }

    // ===== Dashboard =====

    pub async fn fetch_dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.get(DASHBOARD_STATS_PATH).await
    }

    pub async fn fetch_recent_activities(&self) -> ApiResult<Vec<Activity>> {
        let items: ListResponse<Activity> = self.get(DASHBOARD_ACTIVITIES_PATH).await?;
        Ok(items.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::models::Vehicle;

    fn client(api_url: &str) -> ApiClient {
        let config = Config {
            api_url: api_url.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let api = client("http://localhost:8000/");
        assert_eq!(api.endpoint("/api/araclar/"), "http://localhost:8000/api/araclar/");
        assert_eq!(api.endpoint("api/token/"), "http://localhost:8000/api/token/");
    }

    #[test]
    fn test_list_response_accepts_plain_and_paged() {
        let plain: ListResponse<Vehicle> = serde_json::from_str(
            r#"[{"id": 1, "plaka": "34 A 1", "marka": "Ford", "model": "Focus", "yil": 2020,
                "tip": "Binek", "kaynak_tipi": "ozmal", "mevcut_durum": "havuzda"}]"#,
        )
        .unwrap();
        assert_eq!(plain.into_vec().len(), 1);

        let paged: ListResponse<Vehicle> = serde_json::from_str(
            r#"{"count": 1, "next": null, "results": [{"id": 2, "plaka": "34 B 2"}]}"#,
        )
        .unwrap();
        let items = paged.into_vec();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].plate, "34 B 2");
    }

    #[test]
    fn test_token_response_without_refresh() {
        let tokens: TokenResponse = serde_json::from_str(r#"{"access": "T2"}"#).unwrap();
        assert_eq!(tokens.access, "T2");
        assert!(tokens.refresh.is_none());
    }

    #[test]
    fn test_new_request_accepts_json() {
        let request = ApiRequest::new(Method::GET, "http://x/api/araclar/");
        assert_eq!(request.headers.get(ACCEPT).unwrap(), "application/json");
        assert!(request.body.is_none());
        assert!(!PendingRequest::new(request).retried);
    }
}
