//! Stateless HTTP request builder and response parser for the book API.
//!
//! # Design
//! `BookClient` holds only a `base_url` and carries no mutable state between
//! calls. Each remote operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Authenticated builders take the bearer token explicitly; the client never
//! remembers it.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Token;
use crate::types::{Book, BookFields, BookId, Credentials, LoginResponse};

/// Synchronous, stateless client for the book API.
#[derive(Debug, Clone)]
pub struct BookClient {
    base_url: String,
}

impl BookClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/login", self.base_url),
            headers: vec![content_type()],
            body: Some(to_json(credentials)?),
        })
    }

    pub fn build_list_books(&self, token: &Token) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/books", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_get_book(&self, token: &Token, id: &BookId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.book_path(id),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    /// The category is sent URL-encoded; how it is matched is up to the server.
    pub fn build_books_by_category(&self, token: &Token, category: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!(
                "{}/books/?category={}",
                self.base_url,
                urlencoding::encode(category)
            ),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_create_book(
        &self,
        token: &Token,
        fields: &BookFields,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/books", self.base_url),
            headers: vec![content_type(), bearer(token)],
            body: Some(to_json(fields)?),
        })
    }

    pub fn build_update_book(
        &self,
        token: &Token,
        id: &BookId,
        fields: &BookFields,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.book_path(id),
            headers: vec![content_type(), bearer(token)],
            body: Some(to_json(fields)?),
        })
    }

    pub fn build_delete_book(&self, token: &Token, id: &BookId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.book_path(id),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    /// Returns the issued token.
    pub fn parse_login(&self, response: HttpResponse) -> Result<Token, ApiError> {
        check_status(&response)?;
        let body: LoginResponse = from_json(&response.body)?;
        Ok(Token::new(body.token))
    }

    pub fn parse_list_books(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    /// `Ok(None)` when the server answers successfully but with no record.
    pub fn parse_get_book(&self, response: HttpResponse) -> Result<Option<Book>, ApiError> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        from_json(&response.body)
    }

    pub fn parse_books_by_category(&self, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    // Mutation bodies are not read: the cache is always refreshed from a list.

    pub fn parse_create_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_update_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete_book(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn book_path(&self, id: &BookId) -> String {
        format!("{}/books/{}", self.base_url, urlencoding::encode(id.as_str()))
    }
}

fn content_type() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

fn bearer(token: &Token) -> (String, String) {
    (
        "authorization".to_string(),
        format!("Bearer {}", token.as_str()),
    )
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Any 2xx is success. 404 gets its own variant, everything else is `HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
