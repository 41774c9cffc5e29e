//! `Library` wires the session, synchronizer, search and edit components
//! together behind the user actions a front end offers.
//!
//! # Design
//! - Every session transition is forwarded to the synchronizer as a
//!   `SessionEvent`; there is no path that changes the token without it.
//! - Components never see each other directly. The session is passed by
//!   reference to whoever needs the token.
//! - The latest user-facing error is kept in `last_error` and cleared at the
//!   start of the next action, like an error banner.

use tracing::{debug, warn};

use crate::client::BookClient;
use crate::edit::{EditSession, Field, Submission};
use crate::error::ClientError;
use crate::http::Transport;
use crate::search::{SearchDispatcher, SearchMode, SearchQuery};
use crate::session::{Session, SessionEvent, SessionManager, SessionObserver, TokenStore};
use crate::sync::CollectionSynchronizer;
use crate::types::{Book, BookId, Credentials};

pub struct Library<T, S> {
    transport: T,
    sessions: SessionManager<S>,
    sync: CollectionSynchronizer,
    search: SearchDispatcher,
    edit: EditSession,
    last_error: Option<ClientError>,
}

impl<T: Transport, S: TokenStore> Library<T, S> {
    pub fn new(base_url: &str, transport: T, store: S) -> Self {
        let client = BookClient::new(base_url);
        Self {
            transport,
            sessions: SessionManager::new(client.clone(), store),
            sync: CollectionSynchronizer::new(client),
            search: SearchDispatcher::new(),
            edit: EditSession::new(),
            last_error: None,
        }
    }

    /// Adopt any persisted token and, if there is one, fetch the collection.
    /// An unreadable token store starts signed out; the failure is kept in
    /// `last_error`.
    pub fn start(&mut self) {
        let event = self.restore();
        self.dispatch(event);
    }

    /// Like `start`, but leaves the cache empty until the next read or
    /// mutation. For one-shot hosts whose next action fetches anyway.
    pub fn resume(&mut self) {
        self.restore();
    }

    fn restore(&mut self) -> SessionEvent {
        match self.sessions.restore() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "token store unreadable, starting signed out");
                self.last_error = Some(e.into());
                SessionEvent::SignedOut
            }
        }
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        self.last_error = None;
        let event = self.sessions.login(&self.transport, credentials);
        let event = self.record(event)?;
        self.dispatch(event);
        Ok(())
    }

    /// Always ends signed out with an empty cache and draft, even if the
    /// token store could not be cleared.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        let cleared = self.sessions.logout();
        self.dispatch(SessionEvent::SignedOut);
        self.edit.reset();
        self.record(cleared.map(|_| ()).map_err(ClientError::from))
    }

    pub fn session(&self) -> &Session {
        self.sessions.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.session().is_authenticated()
    }

    pub fn token_store(&self) -> &S {
        self.sessions.store()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn books(&self) -> &[Book] {
        self.sync.books()
    }

    pub fn synchronizer(&self) -> &CollectionSynchronizer {
        &self.sync
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    pub fn refresh(&mut self) -> Result<&[Book], ClientError> {
        let result = self
            .sync
            .list(&self.transport, self.sessions.session())
            .map(|_| ());
        self.record(result)?;
        Ok(self.sync.books())
    }

    // --- search ---

    pub fn search_query(&self) -> &SearchQuery {
        self.search.query()
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.search.set_mode(mode);
    }

    pub fn set_search_value(&mut self, value: impl Into<String>) {
        self.search.set_value(value);
    }

    pub fn search(&mut self) -> Result<&[Book], ClientError> {
        let result = self
            .search
            .search(&mut self.sync, &self.transport, self.sessions.session())
            .map(|_| ());
        self.record(result)?;
        Ok(self.sync.books())
    }

    pub fn clear_search(&mut self) -> Result<&[Book], ClientError> {
        let result = self
            .search
            .clear(&mut self.sync, &self.transport, self.sessions.session())
            .map(|_| ());
        self.record(result)?;
        Ok(self.sync.books())
    }

    // --- editing ---

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.edit.set_field(field, value);
    }

    /// Load a displayed book into the draft for editing.
    pub fn begin_edit(&mut self, book: &Book) -> Result<(), ClientError> {
        self.last_error = None;
        let guard = self.sessions.session().require().map(|_| ());
        self.record(guard)?;
        self.edit.begin_edit(book);
        debug!(id = %book.id, "editing");
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.edit.reset();
    }

    /// Create or update from the draft, depending on whether a book is targeted.
    /// On success the draft is cleared and the session returns to idle.
    pub fn submit(&mut self) -> Result<(), ClientError> {
        self.last_error = None;
        let result = self.submit_inner();
        self.record(result)
    }

    fn submit_inner(&mut self) -> Result<(), ClientError> {
        let session = self.sessions.session();
        session.require()?;
        match self.edit.submission()? {
            Submission::Create(fields) => self.sync.create(&self.transport, session, &fields)?,
            Submission::Update(id, fields) => {
                self.sync.update(&self.transport, session, &id, &fields)?
            }
        }
        self.edit.reset();
        Ok(())
    }

    /// Delete `id`; if it was being edited, the edit session is dropped.
    pub fn delete(&mut self, id: &BookId) -> Result<(), ClientError> {
        self.last_error = None;
        let result = self.sync.delete(&self.transport, self.sessions.session(), id);
        self.record(result)?;
        self.edit.forget(id);
        Ok(())
    }

    fn dispatch(&mut self, event: SessionEvent) {
        self.sync.on_session_event(&event, &self.transport);
    }

    fn record<R>(&mut self, result: Result<R, ClientError>) -> Result<R, ClientError> {
        if let Err(e) = &result {
            self.last_error = Some(e.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditState;
    use crate::http::HttpMethod;
    use crate::session::{MemoryTokenStore, Token};
    use crate::testing::{book_json, books_json, FailingTokenStore, ScriptedTransport};

    fn library(store: MemoryTokenStore) -> Library<ScriptedTransport, MemoryTokenStore> {
        Library::new("http://api", ScriptedTransport::new(), store)
    }

    fn signed_in_with(books: &[(u64, &str, &str)]) -> Library<ScriptedTransport, MemoryTokenStore> {
        let mut lib = library(MemoryTokenStore::with_token("tok123"));
        lib.transport().push(200, &books_json(books));
        lib.start();
        lib
    }

    #[test]
    fn login_then_list_uses_issued_token() {
        let mut lib = library(MemoryTokenStore::new());
        lib.transport().push(200, r#"{"token":"tok123"}"#);
        lib.transport().push(200, &books_json(&[(1, "Dune", "SciFi")]));

        lib.login(&Credentials::new("a@b.com", "x")).unwrap();

        let requests = lib.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path, "http://api/books");
        assert_eq!(requests[1].header("authorization"), Some("Bearer tok123"));
        assert_eq!(lib.books().len(), 1);
        assert_eq!(lib.token_store().load().unwrap().as_deref(), Some("tok123"));
    }

    #[test]
    fn failed_login_is_recorded_and_cleared_by_next_success() {
        let mut lib = library(MemoryTokenStore::new());
        lib.transport().push(401, "");
        assert_eq!(
            lib.login(&Credentials::new("a@b.com", "bad")).unwrap_err(),
            ClientError::InvalidCredentials
        );
        assert_eq!(lib.last_error(), Some(&ClientError::InvalidCredentials));

        lib.transport().push(200, r#"{"token":"t"}"#);
        lib.transport().push(200, "[]");
        lib.login(&Credentials::new("a@b.com", "x")).unwrap();
        assert!(lib.last_error().is_none());
    }

    #[test]
    fn start_without_token_fetches_nothing() {
        let mut lib = library(MemoryTokenStore::new());
        lib.start();
        assert!(!lib.is_authenticated());
        assert!(lib.books().is_empty());
        assert_eq!(lib.transport().request_count(), 0);
    }

    #[test]
    fn unreadable_store_starts_signed_out() {
        let mut lib = Library::new(
            "http://api",
            ScriptedTransport::new(),
            FailingTokenStore::failing_load(),
        );
        lib.start();

        assert!(!lib.is_authenticated());
        assert!(lib.books().is_empty());
        assert_eq!(lib.transport().request_count(), 0);
        assert!(matches!(lib.last_error(), Some(ClientError::Storage(_))));

        lib.transport().push(200, r#"{"token":"tok123"}"#);
        lib.transport().push(200, "[]");
        lib.login(&Credentials::new("a@b.com", "x")).unwrap();
        assert!(lib.is_authenticated());
        assert!(lib.last_error().is_none());
    }

    #[test]
    fn resume_adopts_token_without_fetching() {
        let mut lib = library(MemoryTokenStore::with_token("tok123"));
        lib.resume();

        assert!(lib.is_authenticated());
        assert_eq!(lib.transport().request_count(), 0);

        lib.transport().push(200, &books_json(&[(1, "Dune", "SciFi")]));
        assert_eq!(lib.refresh().unwrap().len(), 1);
        assert_eq!(
            lib.transport().requests()[0].header("authorization"),
            Some("Bearer tok123")
        );
    }

    #[test]
    fn login_whose_token_cannot_be_saved_stays_signed_out() {
        let mut lib = Library::new(
            "http://api",
            ScriptedTransport::new(),
            FailingTokenStore::failing_save(),
        );
        lib.transport().push(200, r#"{"token":"tok123"}"#);

        let err = lib.login(&Credentials::new("a@b.com", "x")).unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(lib.last_error(), Some(&err));
        assert!(!lib.is_authenticated());
        assert!(lib.books().is_empty());
        let requests = lib.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "http://api/login");
    }

    #[test]
    fn logout_clears_memory_even_when_store_fails() {
        let transport = ScriptedTransport::new();
        transport.push(200, &books_json(&[(1, "Dune", "SciFi")]));
        let mut lib = Library::new(
            "http://api",
            transport,
            FailingTokenStore::failing_clear("tok123"),
        );
        lib.start();
        assert_eq!(lib.books().len(), 1);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();

        let err = lib.logout().unwrap_err();

        assert!(matches!(err, ClientError::Storage(_)));
        assert!(!lib.is_authenticated());
        assert!(lib.books().is_empty());
        assert_eq!(lib.edit_session().state(), &EditState::Idle);
    }

    #[test]
    fn start_with_persisted_token_fetches() {
        let lib = signed_in_with(&[(1, "Dune", "SciFi")]);
        assert_eq!(lib.session().token(), Some(&Token::new("tok123")));
        assert_eq!(lib.books().len(), 1);
    }

    #[test]
    fn logout_empties_everything() {
        let mut lib = signed_in_with(&[(1, "Dune", "SciFi")]);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();

        lib.logout().unwrap();

        assert!(!lib.is_authenticated());
        assert!(lib.books().is_empty());
        assert_eq!(lib.token_store().load().unwrap(), None);
        assert_eq!(lib.edit_session().state(), &EditState::Idle);
    }

    #[test]
    fn logout_when_signed_out_is_harmless() {
        let mut lib = library(MemoryTokenStore::new());
        lib.logout().unwrap();
        assert!(lib.books().is_empty());
        assert!(!lib.is_authenticated());
    }

    #[test]
    fn create_from_draft_sends_integers_and_refreshes() {
        let mut lib = signed_in_with(&[]);
        lib.set_field(Field::Title, "Dune");
        lib.set_field(Field::Author, "Herbert");
        lib.set_field(Field::Year, "1965");
        lib.set_field(Field::Pages, "412");
        lib.set_field(Field::Category, "SciFi");
        lib.transport().push(201, &book_json(1, "Dune", "SciFi"));
        lib.transport().push(200, &books_json(&[(1, "Dune", "SciFi")]));

        lib.submit().unwrap();

        let requests = lib.transport().requests();
        let create = &requests[1];
        assert_eq!(create.method, HttpMethod::Post);
        let body: serde_json::Value =
            serde_json::from_str(create.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["year"], serde_json::json!(1965));
        assert_eq!(body["pages"], serde_json::json!(412));
        assert_eq!(body["title"], "Dune");
        assert_eq!(requests[2].method, HttpMethod::Get);
        assert_eq!(lib.books().len(), 1);
        assert_eq!(lib.edit_session().state(), &EditState::Idle);
        assert!(lib.edit_session().draft().is_empty());
    }

    #[test]
    fn submit_while_editing_updates_that_id() {
        let mut lib = signed_in_with(&[(7, "Dune", "SciFi")]);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();
        lib.set_field(Field::Title, "Dune (revised)");
        lib.transport().push(200, "{}");
        lib.transport().push(200, &books_json(&[(7, "Dune (revised)", "SciFi")]));

        lib.submit().unwrap();

        let requests = lib.transport().requests();
        assert_eq!(requests[1].method, HttpMethod::Put);
        assert_eq!(requests[1].path, "http://api/books/7");
        assert_eq!(lib.edit_session().active_id(), None);
        assert_eq!(lib.books()[0].title, "Dune (revised)");
    }

    #[test]
    fn failed_submit_keeps_draft_and_cache() {
        let mut lib = signed_in_with(&[(7, "Dune", "SciFi")]);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();
        lib.transport().push(500, "boom");

        let err = lib.submit().unwrap_err();

        assert_eq!(err.to_string(), "unauthorized or error editing book");
        assert_eq!(lib.last_error(), Some(&err));
        assert_eq!(lib.edit_session().active_id(), Some(&BookId::from(7)));
        assert_eq!(lib.books().len(), 1);
    }

    #[test]
    fn submit_without_token_is_guarded() {
        let mut lib = library(MemoryTokenStore::new());
        lib.set_field(Field::Title, "Dune");
        assert_eq!(lib.submit().unwrap_err(), ClientError::Unauthenticated);
        assert_eq!(lib.transport().request_count(), 0);
        assert_eq!(lib.edit_session().draft().title, "Dune");
    }

    #[test]
    fn begin_edit_requires_token() {
        let mut lib = signed_in_with(&[(7, "Dune", "SciFi")]);
        let book = lib.books()[0].clone();
        lib.logout().unwrap();
        assert_eq!(lib.begin_edit(&book).unwrap_err(), ClientError::Unauthenticated);
        assert_eq!(lib.edit_session().state(), &EditState::Idle);
    }

    #[test]
    fn deleting_edited_book_resets_edit_session() {
        let mut lib = signed_in_with(&[(7, "Dune", "SciFi"), (8, "Emma", "Classic")]);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();
        lib.transport().push(204, "");
        lib.transport().push(200, &books_json(&[(8, "Emma", "Classic")]));

        lib.delete(&BookId::from(7)).unwrap();

        assert_eq!(lib.edit_session().state(), &EditState::Idle);
        assert!(lib.edit_session().draft().is_empty());
        assert_eq!(lib.books().len(), 1);
    }

    #[test]
    fn deleting_other_book_keeps_edit_session() {
        let mut lib = signed_in_with(&[(7, "Dune", "SciFi"), (8, "Emma", "Classic")]);
        let book = lib.books()[0].clone();
        lib.begin_edit(&book).unwrap();
        lib.transport().push(204, "");
        lib.transport().push(200, &books_json(&[(7, "Dune", "SciFi")]));

        lib.delete(&BookId::from(8)).unwrap();
        assert_eq!(lib.edit_session().active_id(), Some(&BookId::from(7)));
    }

    #[test]
    fn search_and_clear_through_library() {
        let mut lib = signed_in_with(&[(1, "Dune", "SciFi"), (2, "Emma", "Classic")]);
        lib.set_search_mode(SearchMode::ByCategory);
        lib.set_search_value("Classic");
        lib.transport().push(200, &books_json(&[(2, "Emma", "Classic")]));
        assert_eq!(lib.search().unwrap().len(), 1);

        lib.transport().push(200, &books_json(&[(1, "Dune", "SciFi"), (2, "Emma", "Classic")]));
        assert_eq!(lib.clear_search().unwrap().len(), 2);
        assert_eq!(lib.search_query().mode, SearchMode::All);
        assert!(lib.search_query().value.is_empty());
    }
}
