// Bibman - Personal Bibliography Manager
// Copyright (C) 2026 Bibman contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Database storage and models
//!
//! All SQLite access for the bibliography: the polymorphic document
//! hierarchy (Document base + Book/Paper subtype rows), publishers and
//! authors deduplicated by natural key, the Writes junction table, and
//! shell users.
//!
//! # Usage Example
//! ```no_run
//! use bibman::storage::{queries, Database, NewBook};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("./bibman.db").await?;
//!
//! let mut book = NewBook::new("Dom Casmurro".to_string(), 1899);
//! book.isbn = Some("978-85-359-0277-5".to_string());
//! let inserted = queries::insert_book(db.pool(), &book).await?;
//!
//! let doc = queries::get_document_by_id(db.pool(), inserted.document_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod models;
pub mod queries;
pub mod schema;
pub mod users;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Author, AuthorWithDocuments, BookDetail, Document, DocumentDetail, DocumentInsert,
    DocumentKind, NewAuthor, NewBook, NewPaper, NewPublisher, NewUser, PaperDetail, Publisher,
    PublisherWithDocuments, User,
};
