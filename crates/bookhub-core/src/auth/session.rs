use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::credentials::{CredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Tokens issued by `POST /token/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: Option<String>,
}

/// The credentials currently held for the user.
///
/// An access token means the user is treated as logged in; the server
/// remains the authority on whether it is still valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    /// Read the session back from the store
    pub fn load(store: &dyn CredentialStore) -> Self {
        Self {
            access_token: store.get(ACCESS_TOKEN_KEY),
            refresh_token: store.get(REFRESH_TOKEN_KEY),
        }
    }

    /// Write both tokens; an absent refresh token clears the stored one.
    pub fn save(&self, store: &dyn CredentialStore) -> Result<()> {
        match self.access_token {
            Some(ref token) => store.set(ACCESS_TOKEN_KEY, token)?,
            None => store.clear(ACCESS_TOKEN_KEY)?,
        }
        match self.refresh_token {
            Some(ref token) => store.set(REFRESH_TOKEN_KEY, token)?,
            None => store.clear(REFRESH_TOKEN_KEY)?,
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_logged_out(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<TokenPair> for Session {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: Some(tokens.access),
            refresh_token: tokens.refresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    #[test]
    fn test_save_then_load() {
        let store = MemoryCredentialStore::new();
        let session = Session::from(TokenPair {
            access: "A1".to_string(),
            refresh: Some("R1".to_string()),
        });
        session.save(&store).unwrap();

        let loaded = Session::load(&store);
        assert_eq!(loaded, session);
        assert!(loaded.is_authenticated());
    }

    #[test]
    fn test_save_without_refresh_clears_stale_refresh() {
        let store = MemoryCredentialStore::new();
        store.set(REFRESH_TOKEN_KEY, "old").unwrap();

        Session::from(TokenPair {
            access: "A1".to_string(),
            refresh: None,
        })
        .save(&store)
        .unwrap();

        assert_eq!(store.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    }

    #[test]
    fn test_empty_store_is_logged_out() {
        let session = Session::load(&MemoryCredentialStore::new());
        assert!(session.is_logged_out());
        assert!(!session.is_authenticated());
    }
}
