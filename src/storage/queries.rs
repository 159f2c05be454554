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

//! Database query functions
//!
//! Every operation that touches more than one table lives here. The
//! conventions:
//!
//! - Functions taking `&SqlitePool` are complete operations; ones that
//!   span several statements open their own transaction and commit or
//!   roll back as a unit.
//! - Functions taking `&mut SqliteConnection` are building blocks meant
//!   to run inside a caller-supplied transaction (`insert_author`,
//!   `link_author`, `insert_document`).
//! - Natural-key collisions on insert (publisher name, author name pair,
//!   document title/year) are never errors: the existing row's id is
//!   looked up and returned instead.
//! - Publisher and author upserts issued by `insert_book`/`insert_paper`
//!   are reference data and deliberately commit independently of the
//!   enclosing document transaction: a failed document insert must not
//!   undo a publisher row another document may already share.

use crate::error::{Error, Result};
use crate::storage::models::*;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// True when the error is a UNIQUE constraint violation
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True when the error is a FOREIGN KEY constraint violation
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// ============================================================================
// PUBLISHER QUERIES
// ============================================================================

/// Insert a publisher, or reuse the row with the same name
///
/// INSERT OR IGNORE on the unique name followed by a select of the id, so
/// the returned id is valid whether or not the row was just created. Not
/// transactional with any caller; see the module notes.
pub async fn insert_publisher(pool: &SqlitePool, publisher: &NewPublisher) -> Result<i64> {
    sqlx::query(
        "INSERT OR IGNORE INTO Publisher (name, address, url) VALUES (?, ?, ?)",
    )
    .bind(&publisher.name)
    .bind(&publisher.address)
    .bind(&publisher.url)
    .execute(pool)
    .await?;

    let publisher_id: i64 = sqlx::query_scalar(
        "SELECT publisher_id FROM Publisher WHERE name = ?",
    )
    .bind(&publisher.name)
    .fetch_one(pool)
    .await?;

    Ok(publisher_id)
}

/// Fetch a publisher and the ids of the documents it published
pub async fn get_publisher_by_id(
    pool: &SqlitePool,
    publisher_id: i64,
) -> Result<Option<PublisherWithDocuments>> {
    let publisher = sqlx::query_as::<_, Publisher>(
        "SELECT * FROM Publisher WHERE publisher_id = ?",
    )
    .bind(publisher_id)
    .fetch_optional(pool)
    .await?;

    let Some(publisher) = publisher else {
        return Ok(None);
    };

    let document_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT document_id FROM Document WHERE publisher_id = ? ORDER BY document_id",
    )
    .bind(publisher_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(PublisherWithDocuments {
        publisher,
        document_ids,
    }))
}

/// List all publishers ordered by name
pub async fn list_publishers(pool: &SqlitePool) -> Result<Vec<Publisher>> {
    let publishers = sqlx::query_as::<_, Publisher>(
        "SELECT * FROM Publisher ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(publishers)
}

/// Full-row update of a publisher by primary key
pub async fn update_publisher(pool: &SqlitePool, publisher: &Publisher) -> Result<()> {
    let result = sqlx::query(
        "UPDATE Publisher SET name = ?, address = ?, url = ? WHERE publisher_id = ?",
    )
    .bind(&publisher.name)
    .bind(&publisher.address)
    .bind(&publisher.url)
    .bind(publisher.publisher_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("publisher {}", publisher.publisher_id)));
    }

    Ok(())
}

/// Delete a publisher, orphaning its documents
///
/// Cascade-null policy: dependents' publisher_id is cleared in the same
/// transaction that removes the publisher row, so no dangling reference
/// can survive.
pub async fn delete_publisher(pool: &SqlitePool, publisher_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE Document SET publisher_id = NULL WHERE publisher_id = ?")
        .bind(publisher_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM Publisher WHERE publisher_id = ?")
        .bind(publisher_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // Dropping the transaction rolls the NULL-out back
        return Err(Error::not_found(format!("publisher {publisher_id}")));
    }

    tx.commit().await?;

    Ok(())
}

// ============================================================================
// AUTHOR QUERIES
// ============================================================================

/// Insert an author, or reuse the row with the same (last, remaining) name
///
/// Runs against a caller-supplied connection so `insert_book` and
/// `insert_paper` can call it inside their transaction. When
/// `document_id` is given the author is also linked to that document.
pub async fn insert_author(
    conn: &mut SqliteConnection,
    author: &NewAuthor,
    document_id: Option<i64>,
) -> Result<i64> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO Author (last_name, remaining_name, birth_date, email, social_url, nationality)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&author.last_name)
    .bind(&author.remaining_name)
    .bind(author.birth_date)
    .bind(&author.email)
    .bind(&author.social_url)
    .bind(&author.nationality)
    .execute(&mut *conn)
    .await;

    let author_id = match inserted {
        Ok(result) => result.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            log::debug!(
                "author '{} {}' already exists, reusing",
                author.remaining_name,
                author.last_name
            );
            sqlx::query_scalar(
                "SELECT author_id FROM Author WHERE last_name = ? AND remaining_name = ?",
            )
            .bind(&author.last_name)
            .bind(&author.remaining_name)
            .fetch_one(&mut *conn)
            .await?
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(document_id) = document_id {
        link_author(conn, document_id, author_id).await?;
    }

    Ok(author_id)
}

/// Link an author to a document
///
/// Linking the same pair twice is a no-op. A nonexistent document or
/// author id is reported as RecordNotFound.
pub async fn link_author(
    conn: &mut SqliteConnection,
    document_id: i64,
    author_id: i64,
) -> Result<()> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO Writes (document_id, author_id) VALUES (?, ?)",
    )
    .bind(document_id)
    .bind(author_id)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => Err(Error::not_found(format!(
            "document {document_id} or author {author_id}"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Fetch an author and the ids of the documents they wrote
pub async fn get_author_by_id(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Option<AuthorWithDocuments>> {
    let author = sqlx::query_as::<_, Author>("SELECT * FROM Author WHERE author_id = ?")
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

    let Some(author) = author else {
        return Ok(None);
    };

    let document_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT document_id FROM Writes WHERE author_id = ? ORDER BY document_id",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(AuthorWithDocuments {
        author,
        document_ids,
    }))
}

/// List all authors ordered by name
pub async fn list_authors(pool: &SqlitePool) -> Result<Vec<Author>> {
    let authors = sqlx::query_as::<_, Author>(
        "SELECT * FROM Author ORDER BY last_name, remaining_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(authors)
}

/// Full-row update of an author by primary key
pub async fn update_author(pool: &SqlitePool, author: &Author) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE Author SET
            last_name = ?, remaining_name = ?, birth_date = ?,
            email = ?, social_url = ?, nationality = ?
        WHERE author_id = ?
        "#,
    )
    .bind(&author.last_name)
    .bind(&author.remaining_name)
    .bind(author.birth_date)
    .bind(&author.email)
    .bind(&author.social_url)
    .bind(&author.nationality)
    .bind(author.author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("author {}", author.author_id)));
    }

    Ok(())
}

/// Delete an author and their Writes links as one transaction
pub async fn delete_author(pool: &SqlitePool, author_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM Writes WHERE author_id = ?")
        .bind(author_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM Author WHERE author_id = ?")
        .bind(author_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("author {author_id}")));
    }

    tx.commit().await?;

    Ok(())
}

// ============================================================================
// DOCUMENT QUERIES
// ============================================================================

/// Insert a Document base row, or reuse the row with the same (title, year)
///
/// Building block for `insert_book`/`insert_paper`; runs on the caller's
/// transaction. When the (title, year) pair already exists the existing
/// id is returned with `created = false` and the caller must skip subtype
/// and author insertion.
pub async fn insert_document(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    title: &str,
    language: Option<&str>,
    year: i64,
    publisher_id: Option<i64>,
) -> Result<DocumentInsert> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO Document (title, language, year, publisher_id, type)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(language)
    .bind(year)
    .bind(publisher_id)
    .bind(kind.as_str())
    .execute(&mut *conn)
    .await;

    match inserted {
        Ok(result) => Ok(DocumentInsert {
            document_id: result.last_insert_rowid(),
            created: true,
        }),
        Err(e) if is_unique_violation(&e) => {
            let document_id: i64 = sqlx::query_scalar(
                "SELECT document_id FROM Document WHERE title = ? AND year = ?",
            )
            .bind(title)
            .bind(year)
            .fetch_one(&mut *conn)
            .await?;

            Ok(DocumentInsert {
                document_id,
                created: false,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert a book with its publisher and authors
///
/// The publisher upsert commits first, on its own; everything else
/// (Document row, Book row, author rows and links) is one transaction.
/// If the (title, year) pair already exists, returns the existing id with
/// `created = false` and changes nothing — a pre-existing document never
/// has authors or subtype fields appended to it.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<DocumentInsert> {
    let publisher_id = match &book.publisher {
        Some(publisher) => Some(insert_publisher(pool, publisher).await?),
        None => None,
    };

    let mut tx = pool.begin().await?;

    let inserted = insert_document(
        &mut tx,
        DocumentKind::Book,
        &book.title,
        book.language.as_deref(),
        book.year,
        publisher_id,
    )
    .await?;

    if !inserted.created {
        log::debug!(
            "document '{}' ({}) already exists as id {}",
            book.title,
            book.year,
            inserted.document_id
        );
        tx.rollback().await?;
        return Ok(inserted);
    }

    sqlx::query(
        "INSERT INTO Book (document_id, isbn, edition, publication_place) VALUES (?, ?, ?, ?)",
    )
    .bind(inserted.document_id)
    .bind(&book.isbn)
    .bind(&book.edition)
    .bind(&book.publication_place)
    .execute(&mut *tx)
    .await?;

    for author in &book.authors {
        insert_author(&mut tx, author, Some(inserted.document_id)).await?;
    }

    tx.commit().await?;

    Ok(inserted)
}

/// Insert a paper with its publisher and authors
///
/// Same transaction boundaries as [`insert_book`].
pub async fn insert_paper(pool: &SqlitePool, paper: &NewPaper) -> Result<DocumentInsert> {
    let publisher_id = match &paper.publisher {
        Some(publisher) => Some(insert_publisher(pool, publisher).await?),
        None => None,
    };

    let mut tx = pool.begin().await?;

    let inserted = insert_document(
        &mut tx,
        DocumentKind::Paper,
        &paper.title,
        paper.language.as_deref(),
        paper.year,
        publisher_id,
    )
    .await?;

    if !inserted.created {
        log::debug!(
            "document '{}' ({}) already exists as id {}",
            paper.title,
            paper.year,
            inserted.document_id
        );
        tx.rollback().await?;
        return Ok(inserted);
    }

    sqlx::query(
        "INSERT INTO Paper (document_id, doi, journal, issue, pages, volume) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(inserted.document_id)
    .bind(&paper.doi)
    .bind(&paper.journal)
    .bind(&paper.issue)
    .bind(&paper.pages)
    .bind(&paper.volume)
    .execute(&mut *tx)
    .await?;

    for author in &paper.authors {
        insert_author(&mut tx, author, Some(inserted.document_id)).await?;
    }

    tx.commit().await?;

    Ok(inserted)
}

/// Reassign a document's publisher
///
/// A nonexistent document or publisher is a RecordNotFound error, never a
/// silent success.
pub async fn set_document_publisher(
    pool: &SqlitePool,
    document_id: i64,
    publisher_id: i64,
) -> Result<()> {
    let result = sqlx::query("UPDATE Document SET publisher_id = ? WHERE document_id = ?")
        .bind(publisher_id)
        .bind(document_id)
        .execute(pool)
        .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            Err(Error::not_found(format!("document {document_id}")))
        }
        Ok(_) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => {
            Err(Error::not_found(format!("publisher {publisher_id}")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Base SELECT for reconstructing documents: Document joined to its
/// optional publisher and to both subtype tables (only the side named by
/// the discriminator is decoded)
const DOCUMENT_SELECT: &str = r#"
SELECT
    d.document_id, d.title, d.language, d.year, d.created_at, d.type,
    p.publisher_id, p.name, p.address, p.url,
    p.created_at AS publisher_created_at,
    b.isbn, b.edition, b.publication_place,
    pa.doi, pa.journal, pa.issue, pa.pages, pa.volume
FROM Document d
LEFT JOIN Publisher p ON d.publisher_id = p.publisher_id
LEFT JOIN Book b ON d.document_id = b.document_id
LEFT JOIN Paper pa ON d.document_id = pa.document_id
"#;

/// Decode one joined document row into a [`Document`] (authors attached
/// separately)
///
/// Dispatch is on the stored `type` discriminator, not on which subtype
/// join produced values. Missing expected columns are decode errors, not
/// nulls.
fn decode_document_row(row: &SqliteRow) -> Result<Document> {
    let tag: String = row.try_get("type")?;
    let kind = DocumentKind::parse(&tag)
        .ok_or_else(|| Error::invalid_input(format!("unknown document type tag '{tag}'")))?;

    let publisher = match row.try_get::<Option<i64>, _>("publisher_id")? {
        Some(publisher_id) => Some(Publisher {
            publisher_id,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            url: row.try_get("url")?,
            created_at: row.try_get("publisher_created_at")?,
        }),
        None => None,
    };

    let detail = match kind {
        DocumentKind::Book => DocumentDetail::Book(BookDetail {
            isbn: row.try_get("isbn")?,
            edition: row.try_get("edition")?,
            publication_place: row.try_get("publication_place")?,
        }),
        DocumentKind::Paper => DocumentDetail::Paper(PaperDetail {
            doi: row.try_get("doi")?,
            journal: row.try_get("journal")?,
            issue: row.try_get("issue")?,
            pages: row.try_get("pages")?,
            volume: row.try_get("volume")?,
        }),
    };

    Ok(Document {
        document_id: row.try_get("document_id")?,
        title: row.try_get("title")?,
        language: row.try_get("language")?,
        year: row.try_get("year")?,
        publisher,
        authors: Vec::new(),
        created_at: row.try_get("created_at")?,
        detail,
    })
}

/// Second query: the author list of a document via Writes
async fn fetch_document_authors(pool: &SqlitePool, document_id: i64) -> Result<Vec<Author>> {
    let authors = sqlx::query_as::<_, Author>(
        r#"
        SELECT a.* FROM Author a
        INNER JOIN Writes w ON a.author_id = w.author_id
        WHERE w.document_id = ?
        ORDER BY a.author_id
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(authors)
}

/// Fetch one document with publisher, subtype fields and authors
pub async fn get_document_by_id(pool: &SqlitePool, document_id: i64) -> Result<Option<Document>> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.document_id = ?");
    let row = sqlx::query(&sql)
        .bind(document_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut document = decode_document_row(&row)?;
    document.authors = fetch_document_authors(pool, document.document_id).await?;

    Ok(Some(document))
}

async fn fetch_documents(pool: &SqlitePool, sql: &str, bind: Option<i64>) -> Result<Vec<Document>> {
    let mut query = sqlx::query(sql);
    if let Some(value) = bind {
        query = query.bind(value);
    }

    let rows = query.fetch_all(pool).await?;

    let mut documents = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut document = decode_document_row(row)?;
        document.authors = fetch_document_authors(pool, document.document_id).await?;
        documents.push(document);
    }

    Ok(documents)
}

/// All documents written by an author
pub async fn get_documents_by_author(pool: &SqlitePool, author_id: i64) -> Result<Vec<Document>> {
    let sql = format!(
        r#"{DOCUMENT_SELECT}
        INNER JOIN Writes w ON d.document_id = w.document_id
        WHERE w.author_id = ?
        ORDER BY d.year, d.title"#
    );
    fetch_documents(pool, &sql, Some(author_id)).await
}

/// All documents owned by a publisher
pub async fn get_documents_by_publisher(
    pool: &SqlitePool,
    publisher_id: i64,
) -> Result<Vec<Document>> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.publisher_id = ? ORDER BY d.year, d.title");
    fetch_documents(pool, &sql, Some(publisher_id)).await
}

/// All books
pub async fn get_books(pool: &SqlitePool) -> Result<Vec<Document>> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.type = 'book' ORDER BY d.title");
    fetch_documents(pool, &sql, None).await
}

/// All papers
pub async fn get_papers(pool: &SqlitePool) -> Result<Vec<Document>> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.type = 'paper' ORDER BY d.title");
    fetch_documents(pool, &sql, None).await
}

/// Full-row update of a document and its subtype row
///
/// One transaction; the subtype UPDATE is dispatched on the document's
/// discriminated type. A missing base or subtype row rolls everything
/// back and reports RecordNotFound.
pub async fn update_document(pool: &SqlitePool, document: &Document) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE Document SET title = ?, language = ?, year = ?, publisher_id = ? WHERE document_id = ?",
    )
    .bind(&document.title)
    .bind(&document.language)
    .bind(document.year)
    .bind(document.publisher.as_ref().map(|p| p.publisher_id))
    .bind(document.document_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("document {}", document.document_id)));
    }

    let result = match &document.detail {
        DocumentDetail::Book(book) => {
            sqlx::query(
                "UPDATE Book SET isbn = ?, edition = ?, publication_place = ? WHERE document_id = ?",
            )
            .bind(&book.isbn)
            .bind(&book.edition)
            .bind(&book.publication_place)
            .bind(document.document_id)
            .execute(&mut *tx)
            .await?
        }
        DocumentDetail::Paper(paper) => {
            sqlx::query(
                "UPDATE Paper SET doi = ?, journal = ?, issue = ?, pages = ?, volume = ? WHERE document_id = ?",
            )
            .bind(&paper.doi)
            .bind(&paper.journal)
            .bind(&paper.issue)
            .bind(&paper.pages)
            .bind(&paper.volume)
            .bind(document.document_id)
            .execute(&mut *tx)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!(
            "{} row for document {}",
            document.kind(),
            document.document_id
        )));
    }

    tx.commit().await?;

    Ok(())
}

/// Delete a document, its subtype row and its Writes links as one
/// transaction
///
/// The subtype table is chosen by reading the stored discriminator. A
/// nonexistent id reports RecordNotFound and leaves the store unchanged.
pub async fn delete_document(pool: &SqlitePool, document_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let tag: Option<String> = sqlx::query_scalar("SELECT type FROM Document WHERE document_id = ?")
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await?;

    let tag = tag.ok_or_else(|| Error::not_found(format!("document {document_id}")))?;
    let kind = DocumentKind::parse(&tag)
        .ok_or_else(|| Error::invalid_input(format!("unknown document type tag '{tag}'")))?;

    let subtype_sql = match kind {
        DocumentKind::Book => "DELETE FROM Book WHERE document_id = ?",
        DocumentKind::Paper => "DELETE FROM Paper WHERE document_id = ?",
    };
    sqlx::query(subtype_sql)
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM Writes WHERE document_id = ?")
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM Document WHERE document_id = ?")
        .bind(document_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
