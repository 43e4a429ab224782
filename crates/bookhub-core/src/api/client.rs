//! API client for communicating with the Bookhub REST API.
//!
//! This module provides the `ApiClient` struct for logging in and making
//! authenticated requests. The access token is read from the credential
//! store on every call; a 401 triggers at most one refresh and one retry.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::{
    CredentialStore, Session, SharedCredentialStore, TokenPair, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::config::Config;
use crate::models::{Book, NewBook};

use super::error::REQUEST_FAILED_MESSAGE;
use super::transport::{HttpResponse, ReqwestTransport, RequestDescriptor, Transport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Obtain an access/refresh pair from username and password
const TOKEN_PATH: &str = "/token/";

/// Exchange a refresh token for a new access token
const TOKEN_REFRESH_PATH: &str = "/token/refresh/";

/// Book collection endpoint
const BOOKS_PATH: &str = "/books/";

/// Refreshes allowed per `request` call. Each refresh buys one retry.
const MAX_TOKEN_REFRESHES: u32 = 1;

/// Shown when the token endpoint rejects a login without a detail message
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: Option<String>,
    refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
}

/// Outcome of a single round-trip
enum Attempt {
    Success(HttpResponse),
    AuthExpired(HttpResponse),
    Failure(HttpResponse),
}

impl Attempt {
    fn classify(response: HttpResponse) -> Self {
        if response.is_success() {
            Attempt::Success(response)
        } else if response.status == reqwest::StatusCode::UNAUTHORIZED {
            Attempt::AuthExpired(response)
        } else {
            Attempt::Failure(response)
        }
    }
}

/// Method, extra headers and JSON body for a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::RequestFailed(format!("Invalid request body: {}", e)))?;
        Ok(Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            body: Some(body),
        })
    }

    /// Add or replace a header sent with the request
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// API client for the Bookhub backend.
/// Clone is cheap - the transport and store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: SharedCredentialStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, store: SharedCredentialStore) -> Self {
        Self { transport, store }
    }

    /// Create a client talking HTTP to the configured backend
    pub fn from_config(config: &Config, store: SharedCredentialStore) -> Result<Self> {
        let transport = ReqwestTransport::new(config.api_base_url(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        info!(base_url = %transport.base_url(), "API client configured");
        Ok(Self::new(Arc::new(transport), store))
    }

    fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// The tokens currently persisted
    pub fn session(&self) -> Session {
        Session::load(self.store())
    }

    // ===== Authentication =====

    /// Exchange username and password for tokens and persist them.
    /// Both tokens are in the store before this returns `Ok`; a store
    /// failure is reported as `StorageError`.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let descriptor = Self::descriptor(
            TOKEN_PATH,
            &RequestOptions::post(&serde_json::json!({
                "username": username,
                "password": password,
            }))?,
            None,
        )?;

        let response = self.transport.send(descriptor).await?;
        let parsed = serde_json::from_str::<TokenResponse>(&response.body).ok();

        match parsed {
            Some(TokenResponse {
                access: Some(access),
                refresh,
            }) if response.is_success() => {
                let tokens = TokenPair { access, refresh };
                Session::from(tokens.clone())
                    .save(self.store())
                    .map_err(|e| {
                        error!(error = %e, "Failed to persist tokens after login");
                        // A partially written pair must not look like a session
                        let _ = self.store().clear_all();
                        ApiError::StorageError(e.to_string())
                    })?;
                info!("Login successful");
                Ok(tokens)
            }
            _ => {
                debug!(status = response.status.as_u16(), "Login rejected");
                Err(ApiError::from_failure_body(&response.body, LOGIN_FAILED_MESSAGE))
            }
        }
    }

    /// Forget both tokens. Safe to call when already logged out.
    pub fn logout(&self) {
        if let Err(e) = self.store().clear_all() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        info!("Logged out");
    }

    /// Trade the stored refresh token for a new access token and persist it.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let refresh = self
            .store()
            .get(REFRESH_TOKEN_KEY)
            .ok_or(ApiError::SessionExpired)?;

        debug!("Access token rejected, refreshing");
        let descriptor = Self::descriptor(
            TOKEN_REFRESH_PATH,
            &RequestOptions::post(&serde_json::json!({ "refresh": refresh }))?,
            None,
        )?;
        let response = self.transport.send(descriptor).await?;

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Token refresh rejected");
            return Err(ApiError::SessionExpired);
        }

        let access = serde_json::from_str::<RefreshResponse>(&response.body)
            .ok()
            .and_then(|r| r.access)
            .ok_or_else(|| {
                warn!("Token refresh response carried no access token");
                ApiError::SessionExpired
            })?;

        self.store().set(ACCESS_TOKEN_KEY, &access).map_err(|e| {
            error!(error = %e, "Failed to persist refreshed access token");
            ApiError::StorageError(e.to_string())
        })?;
        info!("Access token refreshed");
        Ok(access)
    }

    // ===== Requests =====

    fn descriptor(
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<RequestDescriptor, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::RequestFailed("Stored access token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(RequestDescriptor {
            path: path.to_string(),
            method: options.method.clone(),
            headers,
            body: options.body.clone(),
        })
    }

    fn parse_json<T: DeserializeOwned>(path: &str, response: &HttpResponse) -> Result<T, ApiError> {
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| {
            warn!(path, error = %e, "Failed to parse JSON response");
            ApiError::RequestFailed(format!("Invalid response from server: {}", e))
        })
    }

    /// Perform a request with the stored credentials.
    ///
    /// A 401 triggers one refresh through `/token/refresh/` and one retry
    /// with the new token. Callers never see whether a refresh happened.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut token = self.store().get(ACCESS_TOKEN_KEY);
        let mut refreshes_left = MAX_TOKEN_REFRESHES;

        loop {
            let descriptor = Self::descriptor(path, &options, token.as_deref())?;
            let response = self.transport.send(descriptor).await?;

            let failed = match Attempt::classify(response) {
                Attempt::Success(response) => return Self::parse_json(path, &response),
                Attempt::AuthExpired(_) if refreshes_left > 0 => {
                    refreshes_left -= 1;
                    token = Some(self.refresh_access_token().await?);
                    continue;
                }
                Attempt::AuthExpired(response) | Attempt::Failure(response) => response,
            };

            return Err(ApiError::from_failure_body(&failed.body, REQUEST_FAILED_MESSAGE));
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch all books visible to the current user
    pub async fn fetch_books(&self) -> Result<Vec<Book>, ApiError> {
        let books: Vec<Book> = self.request(BOOKS_PATH, RequestOptions::get()).await?;
        debug!(count = books.len(), "Books fetched");
        Ok(books)
    }

    /// Create a book and return the stored record
    pub async fn add_book(&self, book: &NewBook) -> Result<Book, ApiError> {
        self.request(BOOKS_PATH, RequestOptions::post(book)?).await
    }
}
