//! Authentication module for managing credentials and session tokens.
//!
//! This module provides:
//! - `CredentialStore`: key/value persistence of the access and refresh tokens,
//!   with file, OS keychain and in-memory backends
//! - `Session`: the token pair currently held for the user
//!
//! Tokens survive process restarts and are cleared on logout.

pub mod credentials;
pub mod session;

pub use credentials::{
    open_credential_store, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, SharedCredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
pub use session::{Session, TokenPair};
