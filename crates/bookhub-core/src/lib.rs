//! Core library for Bookhub.
//!
//! Everything here is UI-agnostic: the terminal client in `bookhub-tui`
//! drives the [`controller::SessionController`] and renders its state.
//!
//! - `api`: authenticated request client, transport seam and error taxonomy
//! - `auth`: credential storage backends and session token data
//! - `config`: persisted application configuration
//! - `controller`: login/logout state machine and book list state
//! - `models`: book records exchanged with the backend

pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, Session};
pub use config::Config;
pub use controller::{SessionController, SessionState};
pub use models::{Book, NewBook};
