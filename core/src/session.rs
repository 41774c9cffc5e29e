//! Authentication token lifecycle.
//!
//! `SessionManager` owns the only copy of the active `Session`. Every
//! transition (login, logout, restore) returns a `SessionEvent` that the
//! caller must hand to its `SessionObserver`s; the collection synchronizer is
//! one, and reacts by fetching or clearing the cache.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::client::BookClient;
use crate::error::{ClientError, StorageError};
use crate::http::Transport;
use crate::types::Credentials;

/// Key under which the token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// The authentication state. While `token` is absent the collection is
/// empty and inaccessible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<Token>,
}

impl Session {
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The token, or `Unauthenticated`.
    pub fn require(&self) -> Result<&Token, ClientError> {
        self.token.as_ref().ok_or(ClientError::Unauthenticated)
    }
}

/// A session state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Token),
    SignedOut,
}

/// Something that must react to every session transition.
pub trait SessionObserver {
    fn on_session_event(&mut self, event: &SessionEvent, transport: &dyn Transport);
}

/// Durable key-value storage for the token.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&mut self, token: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// In-process token storage. Survives nothing; for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        Self { entries }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(TOKEN_KEY).cloned())
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        self.entries.insert(TOKEN_KEY.to_string(), token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.remove(TOKEN_KEY);
        Ok(())
    }
}

/// Owns the `Session` and keeps it in step with the `TokenStore`.
#[derive(Debug)]
pub struct SessionManager<S> {
    client: BookClient,
    store: S,
    session: Session,
}

impl<S: TokenStore> SessionManager<S> {
    pub fn new(client: BookClient, store: S) -> Self {
        Self {
            client,
            store,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adopt a previously persisted token without checking it with the
    /// server. An invalid token shows up as an empty collection later.
    pub fn restore(&mut self) -> Result<SessionEvent, StorageError> {
        let stored = self.store.load()?.filter(|t| !t.is_empty());
        self.session.token = stored.map(Token::new);
        let event = match &self.session.token {
            Some(token) => {
                debug!("restored persisted session");
                SessionEvent::SignedIn(token.clone())
            }
            None => SessionEvent::SignedOut,
        };
        Ok(event)
    }

    /// Exchange credentials for a token. On any failure the current session
    /// and the stored token are left untouched.
    pub fn login(
        &mut self,
        transport: &dyn Transport,
        credentials: &Credentials,
    ) -> Result<SessionEvent, ClientError> {
        // Two plain strings always encode; treat the impossible case as a rejection.
        let request = self
            .client
            .build_login(credentials)
            .map_err(|_| ClientError::InvalidCredentials)?;
        debug!(email = %credentials.email, "logging in");

        let response = transport
            .execute(&request)
            .map_err(|e| ClientError::Network(e.0))?;
        let token = self.client.parse_login(response).map_err(|e| {
            warn!(error = %e, "login rejected");
            ClientError::InvalidCredentials
        })?;

        self.store.save(token.as_str())?;
        self.session.token = Some(token.clone());
        info!(email = %credentials.email, "logged in");
        Ok(SessionEvent::SignedIn(token))
    }

    /// Drop the session. The in-memory token is cleared even when the store
    /// fails, so callers should always dispatch `SignedOut`.
    pub fn logout(&mut self) -> Result<SessionEvent, StorageError> {
        self.session.token = None;
        info!("logged out");
        self.store.clear()?;
        Ok(SessionEvent::SignedOut)
    }
}
