//! Session state for the UI.
//!
//! `SessionController` owns the authentication status and the book list.
//! Views read its state and call its async actions; it talks to the backend
//! only through [`ApiClient`].

use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Book, NewBook};

/// Shown when a call fails without reaching the server
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Shown after a forced logout
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Required-field message for the login form
pub const CREDENTIALS_REQUIRED_MESSAGE: &str = "Username and password required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    /// Authenticated, book fetch in flight
    Loading,
    /// Authenticated, books loaded
    Ready,
    /// Authenticated, last fetch failed
    Error(String),
}

/// Map an API error to the text shown to the user
pub fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
        ApiError::RequestFailed(detail) => detail.clone(),
        ApiError::NetworkError(_) => NETWORK_ERROR_MESSAGE.to_string(),
        ApiError::StorageError(_) => err.to_string(),
    }
}

pub struct SessionController {
    client: ApiClient,
    token: Option<String>,
    state: SessionState,
    books: Vec<Book>,

    /// Set on every transition into the authenticated state and consumed
    /// by `run_effects`, so each transition fetches books exactly once.
    fetch_scheduled: bool,

    login_error: Option<String>,

    /// One-off message for the status bar (e.g. forced logout)
    notice: Option<String>,
}

impl SessionController {
    /// Restore the session from the credential store.
    /// A stored access token counts as a login and schedules a fetch.
    pub fn new(client: ApiClient) -> Self {
        let token = client.session().access_token;
        let mut controller = Self {
            client,
            token: None,
            state: SessionState::LoggedOut,
            books: Vec::new(),
            fetch_scheduled: false,
            login_error: None,
            notice: None,
        };
        if let Some(token) = token {
            debug!("Restored stored session");
            controller.enter_authenticated(token);
        }
        controller
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.state {
            SessionState::Error(ref msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_login_error(&mut self) {
        self.login_error = None;
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Whether a book fetch is waiting for `run_effects`
    pub fn fetch_scheduled(&self) -> bool {
        self.fetch_scheduled
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn enter_authenticated(&mut self, token: String) {
        let was_authenticated = self.token.is_some();
        self.token = Some(token);
        if !was_authenticated {
            self.state = SessionState::Loading;
            self.fetch_scheduled = true;
        }
    }

    /// Pick up a token replaced by a silent refresh
    fn sync_token(&mut self) {
        if self.token.is_some() {
            if let Some(token) = self.client.session().access_token {
                self.token = Some(token);
            }
        }
    }

    fn handle_error(&mut self, err: &ApiError) {
        if err.is_session_expired() {
            warn!("Session expired, logging out");
            self.logout();
            self.notice = Some(SESSION_EXPIRED_MESSAGE.to_string());
        } else {
            self.state = SessionState::Error(user_message(err));
        }
    }

    /// Perform a scheduled book fetch, if any
    pub async fn run_effects(&mut self) {
        if std::mem::take(&mut self.fetch_scheduled) {
            self.load_books().await;
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Log in and load books.
    ///
    /// Tokens are persisted by the client before the fetch starts. The
    /// exclusive borrow spans the whole call, so callers that queue logins
    /// track the in-flight state themselves.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        if username.trim().is_empty() || password.is_empty() {
            self.login_error = Some(CREDENTIALS_REQUIRED_MESSAGE.to_string());
            return Err(ApiError::RequestFailed(CREDENTIALS_REQUIRED_MESSAGE.to_string()));
        }

        self.login_error = None;
        self.notice = None;
        let result = self.client.login(username, password).await;

        match result {
            Ok(tokens) => {
                info!(username, "Logged in");
                self.enter_authenticated(tokens.access);
                self.run_effects().await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(user_message(&e));
                Err(e)
            }
        }
    }

    /// Fetch the book list; the loading state is always left on completion.
    pub async fn load_books(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        self.state = SessionState::Loading;

        match self.client.fetch_books().await {
            Ok(books) => {
                self.sync_token();
                info!(count = books.len(), "Books loaded");
                self.books = books;
                self.state = SessionState::Ready;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load books");
                self.sync_token();
                self.handle_error(&e);
            }
        }
    }

    /// Create a book and append it to the list on success.
    pub async fn add_book(&mut self, book: NewBook) -> Result<(), String> {
        book.validate()?;
        if !self.is_authenticated() {
            return Err(SESSION_EXPIRED_MESSAGE.to_string());
        }

        match self.client.add_book(&book).await {
            Ok(created) => {
                self.sync_token();
                info!(id = created.id, "Book created");
                self.books.push(created);
                if !matches!(self.state, SessionState::Loading) {
                    self.state = SessionState::Ready;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to create book");
                self.sync_token();
                let message = user_message(&e);
                if e.is_session_expired() {
                    self.handle_error(&e);
                }
                Err(message)
            }
        }
    }

    /// Clear credentials and state. Safe to call when already logged out.
    pub fn logout(&mut self) {
        self.client.logout();
        self.token = None;
        self.books.clear();
        self.state = SessionState::LoggedOut;
        self.fetch_scheduled = false;
        self.login_error = None;
        self.notice = None;
    }
}
