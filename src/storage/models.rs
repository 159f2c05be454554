//! Database models for bibman
//!
//! Bibliographic entities and the record structs used to insert them.
//! The document hierarchy is polymorphic: every `Document` row carries a
//! `type` discriminator and exactly one companion row in `Book` or
//! `Paper`. In memory that pair is a [`Document`] aggregate holding a
//! [`DocumentDetail`] enum, so a fetched document can never be both (or
//! neither) subtype.
//!
//! # SQLite Adaptations
//! - DateTime stored as TEXT (CURRENT_TIMESTAMP format, decoded as UTC)
//! - Birth dates stored as TEXT in ISO 8601 (YYYY-MM-DD)
//! - The discriminator is stored as TEXT ('book' / 'paper')
//! - Many-to-many document/author links live in the Writes junction table

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// DISCRIMINATOR
// ============================================================================

/// Concrete type of a document row
///
/// Stored in the `type` column of `Document`; the matching subtype table
/// holds the per-kind fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Book,
    Paper,
}

impl DocumentKind {
    /// Tag value stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Book => "book",
            DocumentKind::Paper => "paper",
        }
    }

    /// Parse a stored tag value
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "book" => Some(DocumentKind::Book),
            "paper" => Some(DocumentKind::Paper),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Publisher row
///
/// Identity is the unique `name`; documents reference a publisher through
/// a nullable foreign key, so deleting a publisher orphans its documents
/// rather than deleting them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Publisher {
    pub publisher_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Author row
///
/// Identity is the unique (last_name, remaining_name) pair, exact-match
/// and case-sensitive.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub author_id: i64,
    pub last_name: String,
    pub remaining_name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub social_url: Option<String>,
    pub nationality: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// "remaining last" display form
    pub fn full_name(&self) -> String {
        format!("{} {}", self.remaining_name, self.last_name)
    }
}

/// Application user (login identity for the shell)
///
/// The password column holds plain text and `authenticate` compares it
/// as such; this tool is single-user and local by design.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Book-specific fields, 1:1 with a Document row tagged 'book'
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookDetail {
    pub isbn: Option<String>,
    pub edition: Option<String>,
    pub publication_place: Option<String>,
}

/// Paper-specific fields, 1:1 with a Document row tagged 'paper'
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperDetail {
    pub doi: Option<String>,
    pub journal: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub volume: Option<String>,
}

/// Subtype payload of a document, discriminated by [`DocumentKind`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocumentDetail {
    Book(BookDetail),
    Paper(PaperDetail),
}

/// A fully reconstructed document: base row, subtype fields, attached
/// publisher and author list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: i64,
    pub title: String,
    pub language: Option<String>,
    pub year: i64,
    pub publisher: Option<Publisher>,
    pub authors: Vec<Author>,
    pub created_at: DateTime<Utc>,
    pub detail: DocumentDetail,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self.detail {
            DocumentDetail::Book(_) => DocumentKind::Book,
            DocumentDetail::Paper(_) => DocumentKind::Paper,
        }
    }

    pub fn as_book(&self) -> Option<&BookDetail> {
        match &self.detail {
            DocumentDetail::Book(b) => Some(b),
            DocumentDetail::Paper(_) => None,
        }
    }

    pub fn as_paper(&self) -> Option<&PaperDetail> {
        match &self.detail {
            DocumentDetail::Paper(p) => Some(p),
            DocumentDetail::Book(_) => None,
        }
    }
}

// ============================================================================
// REVERSE-INDEX AGGREGATES
// ============================================================================

/// Publisher plus the ids of the documents it published
///
/// The id list is a non-owning reverse index computed at fetch time; the
/// Publisher table itself carries no document reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherWithDocuments {
    pub publisher: Publisher,
    pub document_ids: Vec<i64>,
}

/// Author plus the ids of the documents they wrote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorWithDocuments {
    pub author: Author,
    pub document_ids: Vec<i64>,
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New publisher record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPublisher {
    pub name: String,
    pub address: Option<String>,
    pub url: Option<String>,
}

impl NewPublisher {
    pub fn new(name: String) -> Self {
        Self {
            name,
            address: None,
            url: None,
        }
    }
}

/// New author record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthor {
    pub last_name: String,
    pub remaining_name: String,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub social_url: Option<String>,
    pub nationality: Option<String>,
}

impl NewAuthor {
    pub fn new(last_name: String, remaining_name: String) -> Self {
        Self {
            last_name,
            remaining_name,
            birth_date: None,
            email: None,
            social_url: None,
            nationality: None,
        }
    }
}

/// New user record for registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// New book record for insertion
///
/// Carries the unresolved publisher and author records; `insert_book`
/// resolves each against its natural key before linking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub language: Option<String>,
    pub year: i64,
    pub isbn: Option<String>,
    pub edition: Option<String>,
    pub publication_place: Option<String>,
    pub publisher: Option<NewPublisher>,
    pub authors: Vec<NewAuthor>,
}

impl NewBook {
    pub fn new(title: String, year: i64) -> Self {
        Self {
            title,
            language: None,
            year,
            isbn: None,
            edition: None,
            publication_place: None,
            publisher: None,
            authors: Vec::new(),
        }
    }
}

/// New paper record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaper {
    pub title: String,
    pub language: Option<String>,
    pub year: i64,
    pub doi: Option<String>,
    pub journal: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub volume: Option<String>,
    pub publisher: Option<NewPublisher>,
    pub authors: Vec<NewAuthor>,
}

impl NewPaper {
    pub fn new(title: String, year: i64) -> Self {
        Self {
            title,
            language: None,
            year,
            doi: None,
            journal: None,
            issue: None,
            pages: None,
            volume: None,
            publisher: None,
            authors: Vec::new(),
        }
    }
}

/// Outcome of a document insert
///
/// `created` is false when the (title, year) pair already existed and the
/// id of the pre-existing row was returned instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInsert {
    pub document_id: i64,
    pub created: bool,
}
