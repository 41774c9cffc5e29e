//! Collection synchronizer: CRUD against the remote API plus the local cache.
//!
//! # Design
//! The cache is only ever replaced wholesale by a successful read. Mutations
//! never patch it; they re-run `list()` after the server accepts them, so the
//! cache is always something the server actually returned.
//!
//! Reads are split into `begin_read` and `complete_read`. Each begun read gets
//! the next generation number, and a completion whose generation is older than
//! the newest issued one is dropped as stale. Clearing the cache also bumps the
//! generation so that a read started before logout can never repopulate it.
//!
//! Read failures are absorbed into an empty cache; the cause is kept in
//! `last_read_failure` and logged. Write failures are returned to the caller.

use tracing::{debug, info, warn};

use crate::client::BookClient;
use crate::error::{Action, ApiError, ClientError, ReadFailure, TransportError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::session::{Session, SessionEvent, SessionObserver, Token};
use crate::types::{Book, BookFields, BookId};

/// A remote read the cache can be populated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    All,
    ById(BookId),
    ByCategory(String),
}

/// A read that has been issued but not yet applied.
#[derive(Debug)]
pub struct PendingRead {
    generation: u64,
    lookup: Lookup,
    request: HttpRequest,
}

impl PendingRead {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }
}

/// What `complete_read` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The cache now holds the result (possibly empty on failure).
    Applied,
    /// A newer read was issued meanwhile; the cache was not touched.
    Stale,
}

#[derive(Debug)]
pub struct CollectionSynchronizer {
    client: BookClient,
    books: Vec<Book>,
    generation: u64,
    last_read_failure: Option<ReadFailure>,
}

impl CollectionSynchronizer {
    pub fn new(client: BookClient) -> Self {
        Self {
            client,
            books: Vec::new(),
            generation: 0,
            last_read_failure: None,
        }
    }

    /// The local cache, in server order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Generation of the most recently issued read.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Why the last applied read came back empty, if it failed.
    pub fn last_read_failure(&self) -> Option<&ReadFailure> {
        self.last_read_failure.as_ref()
    }

    /// Empty the cache and invalidate every in-flight read.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.books.clear();
        self.last_read_failure = None;
    }

    pub fn begin_read(
        &mut self,
        session: &Session,
        lookup: Lookup,
    ) -> Result<PendingRead, ClientError> {
        let token = session.require()?;
        Ok(self.issue_read(token, lookup))
    }

    /// Apply a read's response unless a newer read has been issued since.
    pub fn complete_read(
        &mut self,
        pending: PendingRead,
        response: Result<HttpResponse, TransportError>,
    ) -> ReadOutcome {
        if pending.generation < self.generation {
            warn!(
                generation = pending.generation,
                latest = self.generation,
                "discarding stale read"
            );
            return ReadOutcome::Stale;
        }

        let result = response
            .map_err(|e| ReadFailure::Transport(e.0))
            .and_then(|response| {
                self.parse_lookup(&pending.lookup, response)
                    .map_err(ReadFailure::from_api)
            });

        match result {
            Ok(books) => {
                debug!(count = books.len(), lookup = ?pending.lookup, "cache refreshed");
                self.books = books;
                self.last_read_failure = None;
            }
            Err(failure) => {
                warn!(%failure, lookup = ?pending.lookup, "read failed, cache emptied");
                self.books.clear();
                self.last_read_failure = Some(failure);
            }
        }
        ReadOutcome::Applied
    }

    /// Begin and complete a read in one step.
    pub fn read(
        &mut self,
        transport: &dyn Transport,
        session: &Session,
        lookup: Lookup,
    ) -> Result<&[Book], ClientError> {
        let token = session.require()?;
        self.read_with(transport, token, lookup);
        Ok(&self.books)
    }

    /// Fetch the full collection. Failures leave an empty cache, not an error.
    pub fn list(
        &mut self,
        transport: &dyn Transport,
        session: &Session,
    ) -> Result<&[Book], ClientError> {
        self.read(transport, session, Lookup::All)
    }

    pub fn create(
        &mut self,
        transport: &dyn Transport,
        session: &Session,
        fields: &BookFields,
    ) -> Result<(), ClientError> {
        let token = session.require()?;
        let request = self.client.build_create_book(token, fields);
        self.mutate(transport, token, Action::Add, request, BookClient::parse_create_book)
    }

    pub fn update(
        &mut self,
        transport: &dyn Transport,
        session: &Session,
        id: &BookId,
        fields: &BookFields,
    ) -> Result<(), ClientError> {
        let token = session.require()?;
        let request = self.client.build_update_book(token, id, fields);
        self.mutate(transport, token, Action::Edit, request, BookClient::parse_update_book)
    }

    pub fn delete(
        &mut self,
        transport: &dyn Transport,
        session: &Session,
        id: &BookId,
    ) -> Result<(), ClientError> {
        let token = session.require()?;
        let request = Ok(self.client.build_delete_book(token, id));
        self.mutate(transport, token, Action::Delete, request, BookClient::parse_delete_book)
    }

    fn mutate(
        &mut self,
        transport: &dyn Transport,
        token: &Token,
        action: Action,
        request: Result<HttpRequest, ApiError>,
        parse: fn(&BookClient, HttpResponse) -> Result<(), ApiError>,
    ) -> Result<(), ClientError> {
        let request = request.map_err(|e| {
            warn!(error = %e, ?action, "could not encode request");
            ClientError::action(action, None)
        })?;
        debug!(method = %request.method, path = %request.path, "sending mutation");

        let response = transport.execute(&request).map_err(|e| {
            warn!(error = %e, ?action, "mutation not delivered");
            ClientError::action(action, None)
        })?;
        let status = response.status;
        parse(&self.client, response).map_err(|e| {
            warn!(error = %e, ?action, "mutation rejected");
            ClientError::action(action, Some(status))
        })?;

        info!(?action, path = %request.path, "mutation accepted, refreshing");
        self.read_with(transport, token, Lookup::All);
        Ok(())
    }

    fn read_with(&mut self, transport: &dyn Transport, token: &Token, lookup: Lookup) -> ReadOutcome {
        let pending = self.issue_read(token, lookup);
        let response = transport.execute(&pending.request);
        self.complete_read(pending, response)
    }

    fn issue_read(&mut self, token: &Token, lookup: Lookup) -> PendingRead {
        self.generation += 1;
        let request = match &lookup {
            Lookup::All => self.client.build_list_books(token),
            Lookup::ById(id) => self.client.build_get_book(token, id),
            Lookup::ByCategory(category) => self.client.build_books_by_category(token, category),
        };
        debug!(generation = self.generation, path = %request.path, "issuing read");
        PendingRead {
            generation: self.generation,
            lookup,
            request,
        }
    }

    fn parse_lookup(&self, lookup: &Lookup, response: HttpResponse) -> Result<Vec<Book>, ApiError> {
        match lookup {
            Lookup::All => self.client.parse_list_books(response),
            Lookup::ById(_) => Ok(self.client.parse_get_book(response)?.into_iter().collect()),
            Lookup::ByCategory(_) => self.client.parse_books_by_category(response),
        }
    }
}

impl SessionObserver for CollectionSynchronizer {
    /// Signing in fetches the collection; signing out empties it.
    fn on_session_event(&mut self, event: &SessionEvent, transport: &dyn Transport) {
        match event {
            SessionEvent::SignedIn(token) => {
                self.read_with(transport, token, Lookup::All);
            }
            SessionEvent::SignedOut => self.clear(),
        }
    }
}
