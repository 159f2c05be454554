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

//! Schema creation
//!
//! Creates all tables if absent. Runs on every database open; there is no
//! versioning or migration bookkeeping, the DDL is the schema.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Create all tables and indexes if they do not exist yet
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- MAIN ENTITIES
-- ============================================================================

-- Publishers, deduplicated by name. Documents point here through a
-- nullable foreign key; deleting a publisher orphans its documents.
CREATE TABLE IF NOT EXISTS Publisher (
    publisher_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    address TEXT,
    url TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Document base rows. The type column discriminates the companion
-- subtype row (Book or Paper); (title, year) is the dedup key.
CREATE TABLE IF NOT EXISTS Document (
    document_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    language TEXT,
    year INTEGER NOT NULL,
    publisher_id INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    type TEXT NOT NULL CHECK (type IN ('book', 'paper')),
    UNIQUE (title, year),
    FOREIGN KEY (publisher_id) REFERENCES Publisher (publisher_id)
);

-- Book subtype, 1:1 with a Document row tagged 'book'
CREATE TABLE IF NOT EXISTS Book (
    document_id INTEGER PRIMARY KEY,
    isbn TEXT UNIQUE,
    edition TEXT,
    publication_place TEXT,
    FOREIGN KEY (document_id) REFERENCES Document (document_id)
);

-- Paper subtype, 1:1 with a Document row tagged 'paper'
CREATE TABLE IF NOT EXISTS Paper (
    document_id INTEGER PRIMARY KEY,
    doi TEXT UNIQUE,
    journal TEXT,
    issue TEXT,
    pages TEXT,
    volume TEXT,
    FOREIGN KEY (document_id) REFERENCES Document (document_id)
);

-- Authors, deduplicated by (last_name, remaining_name)
CREATE TABLE IF NOT EXISTS Author (
    author_id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_name TEXT NOT NULL,
    remaining_name TEXT NOT NULL,
    birth_date TEXT,
    email TEXT,
    social_url TEXT,
    nationality TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (last_name, remaining_name)
);

-- Application users (shell login)
CREATE TABLE IF NOT EXISTS User (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    email TEXT
);

-- ============================================================================
-- JUNCTION TABLES
-- ============================================================================

-- Document <-> Author, no payload beyond the two keys
CREATE TABLE IF NOT EXISTS Writes (
    document_id INTEGER NOT NULL,
    author_id INTEGER NOT NULL,
    PRIMARY KEY (document_id, author_id),
    FOREIGN KEY (document_id) REFERENCES Document (document_id),
    FOREIGN KEY (author_id) REFERENCES Author (author_id)
);

-- ============================================================================
-- INDEXES
-- ============================================================================

CREATE INDEX IF NOT EXISTS idx_document_publisher ON Document (publisher_id);
CREATE INDEX IF NOT EXISTS idx_writes_author ON Writes (author_id);
        "#,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::storage::database::Database;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        // A second run over an existing schema must be a no-op
        super::create_schema(db.pool()).await.expect("Second create_schema failed");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("Failed to list tables");

        for expected in ["Author", "Book", "Document", "Paper", "Publisher", "User", "Writes"] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }
}
