//! Application state management for the Bookhub TUI.
//!
//! `App` wraps the core `SessionController` with the UI-only state: the
//! requested route, form inputs and focus, list selection, overlays and the
//! queue of actions waiting to run on the next tick.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use bookhub_core::auth::open_credential_store;
use bookhub_core::{ApiClient, Config, NewBook, SessionController};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for book title and author input (matches the backend columns).
const MAX_BOOK_FIELD_LENGTH: usize = 200;

/// Length of a `YYYY-MM-DD` date
const DATE_INPUT_LENGTH: usize = 10;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// Routing
// ============================================================================

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Books,
}

impl Route {
    /// Apply the authentication gate: the book list is only reachable with a
    /// token, and the login form redirects away once logged in.
    pub fn resolve(self, authenticated: bool) -> Route {
        match (self, authenticated) {
            (Route::Books, false) => Route::Login,
            (Route::Login, true) => Route::Books,
            (route, _) => route,
        }
    }
}

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay state on top of the current route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    AddingBook,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

/// Add-book form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BookFormFocus {
    Title,
    Author,
    PublishedDate,
    Button,
}

impl BookFormFocus {
    pub fn next(self) -> Self {
        match self {
            BookFormFocus::Title => BookFormFocus::Author,
            BookFormFocus::Author => BookFormFocus::PublishedDate,
            BookFormFocus::PublishedDate => BookFormFocus::Button,
            BookFormFocus::Button => BookFormFocus::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            BookFormFocus::Title => BookFormFocus::Button,
            BookFormFocus::Author => BookFormFocus::Title,
            BookFormFocus::PublishedDate => BookFormFocus::Author,
            BookFormFocus::Button => BookFormFocus::PublishedDate,
        }
    }
}

/// Network actions queued by input handling.
///
/// They run after the next frame is drawn so the in-flight state is visible.
#[derive(Debug, Clone, PartialEq)]
enum PendingAction {
    Login,
    ReloadBooks,
    AddBook(NewBook),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: SessionController,

    // UI State
    pub state: AppState,
    pub requested_route: Route,
    pub book_selection: usize,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,

    // Add-book form state
    pub book_title: String,
    pub book_author: String,
    pub book_published_date: String,
    pub book_focus: BookFormFocus,
    pub book_error: Option<String>,

    // Status message
    pub status_message: Option<String>,

    pending: Option<PendingAction>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let store = open_credential_store(&config)?;
        let client = ApiClient::from_config(&config, store)?;
        let session = SessionController::new(client);
        debug!(authenticated = session.is_authenticated(), "Session restored");

        // Get credentials from env vars or config
        let login_username = std::env::var("BOOKHUB_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("BOOKHUB_PASSWORD").unwrap_or_default();

        Ok(Self::with_session(config, session, login_username, login_password))
    }

    pub fn with_session(
        config: Config,
        session: SessionController,
        login_username: String,
        login_password: String,
    ) -> Self {
        let login_focus = if login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };

        Self {
            config,
            session,

            state: AppState::Normal,
            requested_route: Route::Books,
            book_selection: 0,

            login_username,
            login_password,
            login_focus,

            book_title: String::new(),
            book_author: String::new(),
            book_published_date: String::new(),
            book_focus: BookFormFocus::Title,
            book_error: None,

            status_message: None,
            pending: None,
        }
    }

    /// The view to show, after applying the authentication gate
    pub fn route(&self) -> Route {
        self.requested_route
            .resolve(self.session.is_authenticated())
    }

    /// A queued login is the in-flight state: it stays set until
    /// `run_pending` has awaited the request.
    pub fn login_in_progress(&self) -> bool {
        matches!(self.pending, Some(PendingAction::Login))
    }

    pub fn add_in_progress(&self) -> bool {
        matches!(self.pending, Some(PendingAction::AddBook(_)))
    }

    pub fn has_pending_work(&self) -> bool {
        self.pending.is_some() || self.session.fetch_scheduled()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Queue a login with the current form contents
    pub fn submit_login(&mut self) {
        if self.login_in_progress() {
            return;
        }
        self.session.clear_login_error();
        self.status_message = None;
        self.pending = Some(PendingAction::Login);
    }

    pub fn reload_books(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(PendingAction::ReloadBooks);
        }
    }

    pub fn start_add_book(&mut self) {
        self.state = AppState::AddingBook;
        self.book_focus = BookFormFocus::Title;
        self.book_error = None;
    }

    pub fn cancel_add_book(&mut self) {
        self.state = AppState::Normal;
        self.book_error = None;
    }

    /// Validate the add-book form and queue the create request
    pub fn submit_add_book(&mut self) {
        if self.add_in_progress() {
            return;
        }
        match parse_new_book(&self.book_title, &self.book_author, &self.book_published_date) {
            Ok(book) => {
                self.book_error = None;
                self.pending = Some(PendingAction::AddBook(book));
            }
            Err(message) => self.book_error = Some(message),
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.requested_route = Route::Login;
        self.book_selection = 0;
        self.login_password.clear();
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.status_message = Some("Logged out".to_string());
    }

    /// Run queued network actions and scheduled fetches.
    pub async fn run_pending(&mut self) {
        match self.pending.take() {
            Some(PendingAction::Login) => self.run_login().await,
            Some(PendingAction::ReloadBooks) => {
                self.session.load_books().await;
                self.status_message = None;
            }
            Some(PendingAction::AddBook(book)) => self.run_add_book(book).await,
            None => {}
        }

        self.session.run_effects().await;
        self.clamp_selection();

        if let Some(notice) = self.session.take_notice() {
            self.requested_route = Route::Login;
            self.state = AppState::Normal;
            self.status_message = Some(notice);
        }
    }

    async fn run_login(&mut self) {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if self.session.login(&username, &password).await.is_ok() {
            self.login_password.clear();
            self.requested_route = Route::Books;
            self.book_selection = 0;

            self.config.last_username = Some(username);
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
            info!("Login complete");
        } else {
            self.login_focus = LoginFocus::Password;
        }
    }

    async fn run_add_book(&mut self, book: NewBook) {
        match self.session.add_book(book).await {
            Ok(()) => {
                self.book_title.clear();
                self.book_author.clear();
                self.book_published_date.clear();
                self.state = AppState::Normal;
                self.book_selection = self.session.books().len().saturating_sub(1);
                self.status_message = Some("Book added".to_string());
            }
            Err(message) => self.book_error = Some(message),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn clamp_selection(&mut self) {
        let len = self.session.books().len();
        if self.book_selection >= len {
            self.book_selection = len.saturating_sub(1);
        }
    }

    pub fn select_next(&mut self, step: usize) {
        let last = self.session.books().len().saturating_sub(1);
        self.book_selection = (self.book_selection + step).min(last);
    }

    pub fn select_prev(&mut self, step: usize) {
        self.book_selection = self.book_selection.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.book_selection = 0;
    }

    pub fn select_last(&mut self) {
        self.book_selection = self.session.books().len().saturating_sub(1);
    }
}

/// Build a `NewBook` from raw form input.
pub fn parse_new_book(title: &str, author: &str, published_date: &str) -> Result<NewBook, String> {
    let date = NaiveDate::parse_from_str(published_date.trim(), "%Y-%m-%d")
        .map_err(|_| "Published date must be YYYY-MM-DD".to_string())?;
    let book = NewBook::new(title.trim(), author.trim(), date);
    book.validate()?;
    Ok(book)
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_book_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_BOOK_FIELD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_date_char(current_len: usize, c: char) -> bool {
    current_len < DATE_INPUT_LENGTH && (c.is_ascii_digit() || c == '-')
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Route Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_books_route_requires_token() {
        assert_eq!(Route::Books.resolve(false), Route::Login);
        assert_eq!(Route::Books.resolve(true), Route::Books);
    }

    #[test]
    fn test_login_route_redirects_when_authenticated() {
        assert_eq!(Route::Login.resolve(true), Route::Books);
        assert_eq!(Route::Login.resolve(false), Route::Login);
    }

    // -------------------------------------------------------------------------
    // Focus Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_focus_cycles() {
        assert_eq!(LoginFocus::Username.next(), LoginFocus::Password);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Username); // Wraps around
        assert_eq!(LoginFocus::Username.prev(), LoginFocus::Button);
        assert_eq!(LoginFocus::Password.prev(), LoginFocus::Username);
    }

    #[test]
    fn test_book_form_focus_cycles() {
        let mut focus = BookFormFocus::Title;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, BookFormFocus::Title);
        assert_eq!(BookFormFocus::Title.prev(), BookFormFocus::Button);
    }

    // -------------------------------------------------------------------------
    // Form Parsing Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_new_book() {
        let book = parse_new_book(" Emma ", "Jane Austen", "1815-12-23").unwrap();
        assert_eq!(book.title, "Emma");
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1815, 12, 23).unwrap());
    }

    #[test]
    fn test_parse_new_book_rejects_bad_input() {
        assert_eq!(
            parse_new_book("Emma", "Jane Austen", "12/23/1815").unwrap_err(),
            "Published date must be YYYY-MM-DD"
        );
        assert_eq!(
            parse_new_book("", "Jane Austen", "1815-12-23").unwrap_err(),
            "Title and author are required"
        );
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(149, 'z'));
        // Exceeds max length
        assert!(!can_add_username_char(150, 'a'));
        // Control characters and whitespace rejected
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, ' '));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_date_char() {
        assert!(can_add_date_char(0, '2'));
        assert!(can_add_date_char(4, '-'));
        assert!(!can_add_date_char(0, 'x'));
        assert!(!can_add_date_char(10, '1'));
    }

    #[test]
    fn test_can_add_book_field_char() {
        assert!(can_add_book_field_char(0, 'É'));
        assert!(!can_add_book_field_char(200, 'a'));
        assert!(!can_add_book_field_char(0, '\t'));
    }

    // -------------------------------------------------------------------------
    // Flow Tests
    // -------------------------------------------------------------------------

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bookhub_core::api::{HttpResponse, RequestDescriptor, Transport, TransportError};
    use bookhub_core::auth::{MemoryCredentialStore, ACCESS_TOKEN_KEY};
    use bookhub_core::CredentialStore;
    use reqwest::StatusCode;
    use serde_json::json;

    /// Replies with queued responses in order and records request paths.
    #[derive(Default)]
    struct FakeTransport {
        replies: Mutex<VecDeque<HttpResponse>>,
        paths: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn with(replies: Vec<(u16, serde_json::Value)>) -> Arc<Self> {
            let replies = replies
                .into_iter()
                .map(|(status, body)| {
                    HttpResponse::new(StatusCode::from_u16(status).unwrap(), body.to_string())
                })
                .collect();
            Arc::new(Self {
                replies: Mutex::new(replies),
                paths: Mutex::new(Vec::new()),
            })
        }

        fn paths(&self) -> Vec<String> {
            self.paths.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse, TransportError> {
            self.paths.lock().unwrap().push(request.path);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError("no reply queued".to_string()))
        }
    }

    fn flow_app(transport: Arc<FakeTransport>, store: Arc<MemoryCredentialStore>) -> App {
        let client = ApiClient::new(transport, store);
        App::with_session(
            Config::default(),
            SessionController::new(client),
            "reader".to_string(),
            "secret".to_string(),
        )
    }

    #[tokio::test]
    async fn test_restored_session_loads_books() {
        let transport = FakeTransport::with(vec![(
            200,
            json!([{"id": 1, "title": "Emma", "author": "Jane Austen"}]),
        )]);
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();

        let mut app = flow_app(transport.clone(), store);
        assert_eq!(app.route(), Route::Books);
        assert!(app.has_pending_work());

        app.run_pending().await;
        assert!(!app.has_pending_work());
        assert_eq!(app.session.books().len(), 1);
        assert_eq!(transport.paths(), vec!["/books/"]);
    }

    #[tokio::test]
    async fn test_expired_session_redirects_to_login() {
        // Stored access token without a refresh token: the 401 cannot be recovered
        let transport = FakeTransport::with(vec![(401, json!({"detail": "Token is invalid"}))]);
        let store = Arc::new(MemoryCredentialStore::new());
        store.set(ACCESS_TOKEN_KEY, "stale").unwrap();

        let mut app = flow_app(transport, store.clone());
        app.run_pending().await;

        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.requested_route, Route::Login);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Session expired. Please log in again.")
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_login_submit_sends_one_request() {
        let transport = FakeTransport::with(vec![
            (401, json!({"detail": "No active account found with the given credentials"})),
            (401, json!({"detail": "No active account found with the given credentials"})),
        ]);
        let store = Arc::new(MemoryCredentialStore::new());

        let mut app = flow_app(transport.clone(), store);
        app.submit_login();
        app.submit_login();
        app.run_pending().await;

        assert!(!app.has_pending_work());
        assert_eq!(transport.paths(), vec!["/token/"]);
    }

    #[tokio::test]
    async fn test_login_with_unwritable_store_shows_error() {
        struct ReadOnlyStore;

        impl CredentialStore for ReadOnlyStore {
            fn get(&self, _key: &str) -> Option<String> {
                None
            }

            fn set(&self, _key: &str, _value: &str) -> Result<()> {
                anyhow::bail!("disk full")
            }

            fn clear(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        let transport = FakeTransport::with(vec![(200, json!({"access": "A1", "refresh": "R1"}))]);
        let client = ApiClient::new(transport.clone(), Arc::new(ReadOnlyStore));
        let mut app = App::with_session(
            Config::default(),
            SessionController::new(client),
            "reader".to_string(),
            "secret".to_string(),
        );

        app.submit_login();
        app.run_pending().await;

        assert_eq!(app.route(), Route::Login);
        assert_eq!(
            app.session.login_error(),
            Some("Failed to save credentials: disk full")
        );
        assert_eq!(app.status_message, None);
        assert_eq!(transport.paths(), vec!["/token/"]);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_form() {
        let transport = FakeTransport::with(vec![(
            401,
            json!({"detail": "No active account found with the given credentials"}),
        )]);
        let store = Arc::new(MemoryCredentialStore::new());

        let mut app = flow_app(transport, store.clone());
        app.submit_login();
        assert!(app.login_in_progress());

        app.run_pending().await;
        assert!(!app.login_in_progress());
        assert_eq!(app.route(), Route::Login);
        assert_eq!(
            app.session.login_error(),
            Some("No active account found with the given credentials")
        );
        assert_eq!(app.login_password, "secret");
        assert_eq!(app.login_focus, LoginFocus::Password);
        assert!(store.is_empty());
    }
}
