//! Domain DTOs for the book API.
//!
//! # Design
//! These types mirror the remote schema but are defined independently of the
//! mock-server crate; integration tests catch any schema drift. `BookId` is
//! opaque: the client only ever echoes it back into a URL path.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned identifier of a book.
///
/// Accepts either a JSON string or a JSON integer and keeps its text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => BookId(s),
            Raw::Number(n) => BookId(n.to_string()),
        })
    }
}

/// A single book as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    #[serde(alias = "_id")]
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub category: String,
    pub pages: i64,
}

/// Request payload for creating or replacing a book. Numeric fields are
/// already integers; string-typed form input goes through `Draft` first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub category: String,
    pub pages: i64,
}

/// Login payload.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_accepts_integer_and_string() {
        let book: Book = serde_json::from_str(
            r#"{"id":7,"title":"Dune","author":"Herbert","year":1965,"category":"SciFi","pages":412}"#,
        )
        .unwrap();
        assert_eq!(book.id, BookId::from(7));

        let book: Book = serde_json::from_str(
            r#"{"id":"64f0c2","title":"Dune","author":"Herbert","year":1965,"category":"SciFi","pages":412}"#,
        )
        .unwrap();
        assert_eq!(book.id.as_str(), "64f0c2");
    }

    #[test]
    fn book_id_accepts_mongo_style_key() {
        let book: Book = serde_json::from_str(
            r#"{"_id":"abc","title":"T","author":"A","year":1,"category":"C","pages":2}"#,
        )
        .unwrap();
        assert_eq!(book.id.as_str(), "abc");
    }

    #[test]
    fn book_rejects_missing_fields() {
        let result: Result<Book, _> = serde_json::from_str(r#"{"id":1,"title":"T"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn fields_serialize_numbers_as_integers() {
        let fields = BookFields {
            title: "Dune".into(),
            author: "Herbert".into(),
            year: 1965,
            category: "SciFi".into(),
            pages: 412,
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["year"], 1965);
        assert_eq!(json["pages"], 412);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("a@b.com"));
        assert!(!dbg.contains("hunter2"));
    }
}
