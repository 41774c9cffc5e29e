//! Error types for the book client.
//!
//! # Design
//! Two layers. `ApiError` is what the stateless `BookClient` parsers return:
//! it says what was wrong with a single response. `ClientError` is the
//! user-facing taxonomy the stateful components surface; its `Display` text
//! is meant to be shown as-is. Read-path failures never become a
//! `ClientError`; they are classified as a `ReadFailure` and logged.

use thiserror::Error;

/// Errors returned by `BookClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// The host could not complete an HTTP round-trip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Durable token storage could not be read or written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("token storage failure: {0}")]
pub struct StorageError(pub String);

impl StorageError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Which write operation an `ActionError` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Edit,
    Delete,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Add => "adding",
            Action::Edit => "editing",
            Action::Delete => "deleting",
        }
    }
}

/// User-facing errors of the session-gated client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Login was rejected. The stored session is left as it was.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A collection operation was attempted without a token. No request was sent.
    #[error("you must log in to view, add or edit books")]
    Unauthenticated,

    /// The server rejected a create, update or delete. The cache is unchanged.
    #[error("unauthorized or error {} book", .action.verb())]
    Action {
        action: Action,
        /// Status code when the server answered, `None` on transport failure.
        status: Option<u16>,
    },

    /// A numeric draft field could not be coerced to an integer.
    #[error("{field} must be a whole number, got {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Login could not reach the server.
    #[error("could not reach the server: {0}")]
    Network(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    pub(crate) fn action(action: Action, status: Option<u16>) -> Self {
        ClientError::Action { action, status }
    }
}

/// Why a read (list or search) produced an empty cache.
///
/// Kept for logging and diagnostics only; reads never surface these to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadFailure {
    #[error("transport: {0}")]
    Transport(String),

    #[error("status {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(String),
}

impl ReadFailure {
    pub(crate) fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => ReadFailure::Status(404),
            ApiError::HttpError { status, .. } => ReadFailure::Status(status),
            ApiError::DeserializationError(msg) | ApiError::SerializationError(msg) => {
                ReadFailure::Decode(msg)
            }
        }
    }
}
