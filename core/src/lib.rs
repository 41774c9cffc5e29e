//! Session-gated client core for the book collection service.
//!
//! # Overview
//! `BookClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). On top of it sit the
//! stateful pieces: the `SessionManager` owns the bearer token, the
//! `CollectionSynchronizer` owns the local cache, the `SearchDispatcher` maps
//! search form input to remote lookups, and the `EditSession` tracks whether
//! the form creates or updates. `Library` wires them together.
//!
//! # Design
//! - All network access goes through the host's `Transport`.
//! - The cache is replaced wholesale by server responses, never patched.
//! - No collection request is built without a token.
//! - Reads carry a generation number; out-of-order completions are dropped.

pub mod client;
pub mod edit;
pub mod error;
pub mod http;
pub mod library;
pub mod search;
pub mod session;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::BookClient;
pub use edit::{Draft, EditSession, EditState, Field, Submission};
pub use error::{Action, ApiError, ClientError, ReadFailure, StorageError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use library::Library;
pub use search::{SearchDispatcher, SearchMode, SearchQuery, UnknownSearchMode};
pub use session::{
    MemoryTokenStore, Session, SessionEvent, SessionManager, SessionObserver, Token, TokenStore,
    TOKEN_KEY,
};
pub use sync::{CollectionSynchronizer, Lookup, PendingRead, ReadOutcome};
pub use types::{Book, BookFields, BookId, Credentials, LoginResponse};
