//! Search dispatch: turns the search form's (mode, value) into a remote lookup.
//!
//! Results go through the synchronizer, so they replace the same cache that
//! `list()` fills and are subject to the same stale-read check.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::ClientError;
use crate::http::Transport;
use crate::session::Session;
use crate::sync::{CollectionSynchronizer, Lookup};
use crate::types::{Book, BookId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    All,
    ById,
    ByCategory,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchMode::All => "all",
            SearchMode::ById => "id",
            SearchMode::ByCategory => "category",
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown search mode {0:?} (expected all, id or category)")]
pub struct UnknownSearchMode(pub String);

impl FromStr for SearchMode {
    type Err = UnknownSearchMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(SearchMode::All),
            "id" => Ok(SearchMode::ById),
            "category" => Ok(SearchMode::ByCategory),
            _ => Err(UnknownSearchMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub mode: SearchMode,
    pub value: String,
}

impl SearchQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(value: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::ById,
            value: value.into(),
        }
    }

    pub fn by_category(value: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::ByCategory,
            value: value.into(),
        }
    }

    /// The remote lookup this query maps to. A blank value in a keyed mode
    /// falls back to the full collection.
    pub fn lookup(&self) -> Lookup {
        let blank = self.value.trim().is_empty();
        match self.mode {
            SearchMode::ById if !blank => Lookup::ById(BookId::new(self.value.as_str())),
            SearchMode::ByCategory if !blank => Lookup::ByCategory(self.value.clone()),
            _ => Lookup::All,
        }
    }
}

/// Holds the current search form state and runs it against the synchronizer.
#[derive(Debug, Default)]
pub struct SearchDispatcher {
    query: SearchQuery,
}

impl SearchDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn set_mode(&mut self, mode: SearchMode) {
        self.query.mode = mode;
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.query.value = value.into();
    }

    pub fn set_query(&mut self, query: SearchQuery) {
        self.query = query;
    }

    /// Run the current query. Failures and missing records give an empty result.
    pub fn search<'a>(
        &self,
        sync: &'a mut CollectionSynchronizer,
        transport: &dyn Transport,
        session: &Session,
    ) -> Result<&'a [Book], ClientError> {
        sync.read(transport, session, self.query.lookup())
    }

    /// Reset to mode `All` with an empty value and fetch everything.
    pub fn clear<'a>(
        &mut self,
        sync: &'a mut CollectionSynchronizer,
        transport: &dyn Transport,
        session: &Session,
    ) -> Result<&'a [Book], ClientError> {
        self.query = SearchQuery::all();
        sync.list(transport, session)
    }
}
