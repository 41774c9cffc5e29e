//! Edit session: whether the form is creating a new book or editing one.
//!
//! The draft is string-typed, exactly as typed into a form. Numbers are only
//! coerced when the draft is turned into a `Submission`.

use crate::error::ClientError;
use crate::types::{Book, BookFields, BookId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Creating,
    Editing(BookId),
}

/// A form field of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Year,
    Category,
    Pages,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub author: String,
    pub year: String,
    pub category: String,
    pub pages: String,
}

impl Draft {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            category: book.category.clone(),
            pages: book.pages.to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Year => &self.year,
            Field::Category => &self.category,
            Field::Pages => &self.pages,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Year => &mut self.year,
            Field::Category => &mut self.category,
            Field::Pages => &mut self.pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Draft::default()
    }

    /// Coerce the draft into a payload. Blank numbers become 0.
    pub fn to_fields(&self) -> Result<BookFields, ClientError> {
        Ok(BookFields {
            title: self.title.clone(),
            author: self.author.clone(),
            year: coerce_int("year", &self.year)?,
            category: self.category.clone(),
            pages: coerce_int("pages", &self.pages)?,
        })
    }
}

fn coerce_int(field: &'static str, raw: &str) -> Result<i64, ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| ClientError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

/// What submitting the draft should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(BookFields),
    Update(BookId, BookFields),
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
    draft: Draft,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn active_id(&self) -> Option<&BookId> {
        match &self.state {
            EditState::Editing(id) => Some(id),
            _ => None,
        }
    }

    /// Typing into the form. Starts a create unless a book is being edited.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        *self.draft.slot(field) = value.into();
        if self.state == EditState::Idle {
            self.state = EditState::Creating;
        }
    }

    /// Load `book` into the draft and target it for update.
    pub fn begin_edit(&mut self, book: &Book) {
        self.draft = Draft::from_book(book);
        self.state = EditState::Editing(book.id.clone());
    }

    /// Back to `Idle` with an empty draft.
    pub fn reset(&mut self) {
        self.state = EditState::Idle;
        self.draft = Draft::default();
    }

    /// Branches only on whether an id is targeted.
    pub fn submission(&self) -> Result<Submission, ClientError> {
        let fields = self.draft.to_fields()?;
        Ok(match self.active_id() {
            Some(id) => Submission::Update(id.clone(), fields),
            None => Submission::Create(fields),
        })
    }

    /// Called after `id` was deleted on the server.
    pub fn forget(&mut self, id: &BookId) {
        if self.active_id() == Some(id) {
            self.reset();
        }
    }
}
