//! Session-aware API client
//!
//! Single gateway for all calls to the RideOps service. Callers never deal
//! with token attachment, silent renewal, or expiry detection; they issue a
//! request and get JSON or a typed error back.

use crate::auth::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use crate::auth::token::expires_within;
use crate::auth::{FileSessionStorage, Session};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::events::{EventBus, SessionEvent};
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};


const LOGIN_ENDPOINT: &str = "/auth/login";
const REGISTER_ENDPOINT: &str = "/auth/register";
const RENEW_ENDPOINT: &str = "/auth/renew";
const HEALTH_ENDPOINT: &str = "/health";

/// Token and user pair returned by the auth endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Value,
}

/// Per-request options merged into the outgoing HTTP call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Add a caller-supplied header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Session-aware client for the RideOps API.
///
/// Owns the session exclusively; views and services read it through accessors
/// and subscribe to [`SessionEvent`]s instead of touching storage directly.
/// The client is `Send + Sync` and is meant to be shared as `Arc<ApiClient>`
/// for the lifetime of the application.
///
/// # Examples
///
/// ```no_run
/// use rideops_client::{ApiClient, ClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(ClientConfig::new("https://api.rideops.example"))?;
/// let auth = client.login("dispatcher@rideops.example", "secret").await?;
/// println!("signed in as {}", auth.user["name"]);
///
/// let rides = client.get("/rides").await?;
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Session>,
    events: EventBus,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with file-backed session storage
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let storage: Arc<dyn SessionStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileSessionStorage::new(dir)),
            None => Arc::new(
                FileSessionStorage::default_location()
                    .map_err(|e| ApiError::Storage(e.to_string()))?,
            ),
        };
        Self::with_storage(config, storage)
    }

    /// Create a client over the given storage backend
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn SessionStorage>) -> ApiResult<Self> {
        reqwest::Url::parse(&config.base_url).map_err(|err| {
            ApiError::Config(format!("invalid base URL '{}': {err}", config.base_url))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let session = RwLock::new(load_session(storage.as_ref()));

        Ok(Self {
            config,
            http,
            storage,
            session,
            events: EventBus::default(),
        })
    }

    /// Current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Store or remove the bearer token, in memory and in persistent storage.
    ///
    /// Side effect only; storage failures are logged and swallowed. Removing
    /// the token also drops the cached user.
    pub fn set_token(&self, token: Option<&str>) {
        self.session.write().set_token(token.map(str::to_owned));
        match token {
            Some(value) => self.persist(TOKEN_KEY, Some(value)),
            None => {
                self.persist(TOKEN_KEY, None);
                self.persist(USER_KEY, None);
            }
        }
    }

    /// Current token: in-memory first, persistent storage as fallback
    pub fn token(&self) -> Option<String> {
        if let Some(token) = self.session.read().token() {
            return Some(token.to_owned());
        }
        self.storage.read(TOKEN_KEY).ok().flatten()
    }

    /// Cached user object: in-memory first, persistent storage as fallback
    pub fn current_user(&self) -> Option<Value> {
        if let Some(user) = self.session.read().user() {
            return Some(user.clone());
        }
        let raw = self.storage.read(USER_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// True iff both a token and a cached user are resolvable
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.current_user().is_some()
    }

    /// Issue an API request.
    ///
    /// Attaches the bearer token when one is known, silently renews a token
    /// whose expiry falls inside the renewal window, and maps failure
    /// responses onto [`ApiError`].
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResult<Value> {
        self.execute(endpoint, options, true).await
    }

    /// GET an endpoint
    pub async fn get(&self, endpoint: &str) -> ApiResult<Value> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// POST a JSON body to an endpoint
    pub async fn post(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
        self.request(endpoint, RequestOptions::post(body)).await
    }

    /// PUT a JSON body to an endpoint
    pub async fn put(&self, endpoint: &str, body: Value) -> ApiResult<Value> {
        self.request(endpoint, RequestOptions::put(body)).await
    }

    /// DELETE an endpoint
    pub async fn delete(&self, endpoint: &str) -> ApiResult<Value> {
        self.request(endpoint, RequestOptions::delete()).await
    }

    /// Authenticate and persist the returned session
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        let value = self.request(LOGIN_ENDPOINT, RequestOptions::post(body)).await?;
        let auth: AuthResponse = serde_json::from_value(value)?;
        self.install_session(&auth.token, &auth.user);
        Ok(auth)
    }

    /// Create an account and persist the returned session
    pub async fn register(&self, user_data: Value) -> ApiResult<AuthResponse> {
        let value = self
            .request(REGISTER_ENDPOINT, RequestOptions::post(user_data))
            .await?;
        let auth: AuthResponse = serde_json::from_value(value)?;
        self.install_session(&auth.token, &auth.user);
        Ok(auth)
    }

    /// Clear token and cached user; no network call
    pub fn logout(&self) {
        debug!("logging out, clearing session");
        self.clear_session();
    }

    /// Lightweight authenticated probe; `false` on any failure
    pub async fn check_connection(&self) -> bool {
        self.request(HEALTH_ENDPOINT, RequestOptions::get())
            .await
            .is_ok()
    }

    /// The request pipeline.
    ///
    /// `allow_renew` is the re-entrancy guard: the renewal call itself runs
    /// with it unset, so one originating request performs at most one renewal.
    #[instrument(skip(self, options), level = "debug")]
    async fn execute(
        &self,
        endpoint: &str,
        options: RequestOptions,
        allow_renew: bool,
    ) -> ApiResult<Value> {
        let mut token = self.token();
        let had_token = token.is_some();

        if allow_renew {
            if let Some(current) = token.as_deref() {
                if expires_within(current, self.config.renewal_window_secs) {
                    match self.renew_session().await {
                        Ok(()) => {
                            token = self.token();
                            self.events.publish(SessionEvent::Renewed);
                            debug!("token renewed ahead of expiry");
                        }
                        Err(err) => {
                            // Swallowed: the original request proceeds with
                            // the pre-renewal token.
                            debug!(error = %err, "token renewal failed, continuing with current token");
                        }
                    }
                }
            }
        }

        let url = self.config.endpoint_url(endpoint);
        let mut request = self
            .http
            .request(options.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        for (key, value) in &options.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let payload: Option<Value> = serde_json::from_str(&raw).ok();
            let server_message = payload
                .as_ref()
                .and_then(|value| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_owned);

            if status == StatusCode::UNAUTHORIZED {
                return Err(self.handle_unauthorized(endpoint, had_token, server_message));
            }

            let message = server_message.unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )
            });
            return Err(ApiError::http(status.as_u16(), message));
        }

        let body = response.text().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// 401 handling: the expired-token marker clears the session and, outside
    /// the login/register endpoints, signals subscribers; any other cause is
    /// surfaced untouched.
    fn handle_unauthorized(
        &self,
        endpoint: &str,
        had_token: bool,
        server_message: Option<String>,
    ) -> ApiError {
        let expired = server_message
            .as_deref()
            .is_some_and(|message| message.eq_ignore_ascii_case("token expired"));

        if expired {
            warn!(endpoint, "server rejected token as expired, clearing session");
            self.clear_session();
            if had_token && !is_auth_endpoint(endpoint) {
                self.events.publish(SessionEvent::Expired);
            }
            return ApiError::SessionExpired;
        }

        ApiError::http(
            StatusCode::UNAUTHORIZED.as_u16(),
            server_message.unwrap_or_else(|| "Unauthorized".to_string()),
        )
    }

    /// Silent renewal. Goes through `execute` with renewal disabled, so it can
    /// never trigger another renewal attempt.
    fn renew_session(&self) -> Pin<Box<dyn Future<Output = ApiResult<()>> + Send + '_>> {
        Box::pin(async move {
            let value = self
                .execute(RENEW_ENDPOINT, RequestOptions::post(json!({})), false)
                .await?;
            let auth: AuthResponse = serde_json::from_value(value)?;
            self.install_session(&auth.token, &auth.user);
            Ok(())
        })
    }

    fn install_session(&self, token: &str, user: &Value) {
        self.session.write().install(token.to_owned(), user.clone());
        self.persist(TOKEN_KEY, Some(token));
        match serde_json::to_string(user) {
            Ok(raw) => self.persist(USER_KEY, Some(&raw)),
            Err(err) => warn!(error = %err, "failed to serialize user for storage"),
        }
    }

    fn clear_session(&self) {
        self.session.write().clear();
        self.persist(TOKEN_KEY, None);
        self.persist(USER_KEY, None);
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.write(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(key, error = %err, "session storage update failed");
        }
    }
}

fn is_auth_endpoint(endpoint: &str) -> bool {
    endpoint == LOGIN_ENDPOINT || endpoint == REGISTER_ENDPOINT
}

/// Read any persisted session at construction time, enforcing the
/// user-implies-token invariant at the boundary.
fn load_session(storage: &dyn SessionStorage) -> Session {
    let mut session = Session::default();

    match storage.read(TOKEN_KEY) {
        Ok(Some(token)) => session.set_token(Some(token)),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "failed to read persisted token"),
    }

    match storage.read(USER_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(user) => session.set_user(Some(user)),
            Err(err) => warn!(error = %err, "discarding undecodable persisted user"),
        },
        Ok(None) => {}
        Err(err) => warn!(error = %err, "failed to read persisted user"),
    }

    session
}
