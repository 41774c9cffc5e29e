//! Scripted transport and token store fakes for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{StorageError, TransportError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::session::TokenStore;

/// Replays queued responses in order and records every request it is given.
/// Runs out into a transport failure.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
    }

    pub fn push_failure(&self, msg: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError::new(msg)));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted response")))
    }
}

/// Token store whose selected operations always fail.
#[derive(Debug, Default)]
pub struct FailingTokenStore {
    token: Option<String>,
    fail_load: bool,
    fail_save: bool,
    fail_clear: bool,
}

impl FailingTokenStore {
    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    /// Holds `token` but cannot forget it.
    pub fn failing_clear(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            fail_clear: true,
            ..Self::default()
        }
    }
}

impl TokenStore for FailingTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        if self.fail_load {
            return Err(StorageError::new("unreadable"));
        }
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        if self.fail_save {
            return Err(StorageError::new("read-only"));
        }
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        if self.fail_clear {
            return Err(StorageError::new("read-only"));
        }
        self.token = None;
        Ok(())
    }
}

pub fn book_json(id: u64, title: &str, category: &str) -> String {
    format!(
        r#"{{"id":{id},"title":"{title}","author":"Author {id}","year":2000,"category":"{category}","pages":100}}"#
    )
}

pub fn books_json(books: &[(u64, &str, &str)]) -> String {
    let items: Vec<String> = books
        .iter()
        .map(|(id, title, category)| book_json(*id, title, category))
        .collect();
    format!("[{}]", items.join(","))
}
