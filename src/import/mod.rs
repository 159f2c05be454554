//! Bulk import from CSL-JSON files
//!
//! Parsing and conversion live in [`csl`]; this module drives the
//! per-item inserts. File-level problems (unreadable file, malformed
//! JSON) abort the import; per-item problems (missing year, database
//! failure) are logged and counted so one bad record does not sink the
//! batch.

pub mod csl;

use crate::error::Result;
use crate::storage::queries;
use sqlx::SqlitePool;

pub use csl::{read_items, CslItem};

/// Outcome counts of a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

/// Insert every item of a CSL-JSON file as a book
pub async fn populate_books<P: AsRef<std::path::Path>>(
    pool: &SqlitePool,
    path: P,
) -> Result<ImportSummary> {
    let items = read_items(path)?;
    let mut summary = ImportSummary::default();

    for item in items {
        let title = item.title.clone();
        let outcome = match item.into_new_book() {
            Ok(book) => queries::insert_book(pool, &book).await,
            Err(e) => Err(e),
        };
        tally(&mut summary, &title, outcome);
    }

    Ok(summary)
}

/// Insert every item of a CSL-JSON file as a paper
pub async fn populate_papers<P: AsRef<std::path::Path>>(
    pool: &SqlitePool,
    path: P,
) -> Result<ImportSummary> {
    let items = read_items(path)?;
    let mut summary = ImportSummary::default();

    for item in items {
        let title = item.title.clone();
        let outcome = match item.into_new_paper() {
            Ok(paper) => queries::insert_paper(pool, &paper).await,
            Err(e) => Err(e),
        };
        tally(&mut summary, &title, outcome);
    }

    Ok(summary)
}

fn tally(
    summary: &mut ImportSummary,
    title: &str,
    outcome: Result<crate::storage::models::DocumentInsert>,
) {
    match outcome {
        Ok(inserted) if inserted.created => summary.created += 1,
        Ok(_) => {
            log::debug!("import: '{title}' already present, skipped");
            summary.existing += 1;
        }
        Err(e) => {
            log::warn!("import: '{title}' failed: {e}");
            summary.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;
    use std::io::Write;

    const PAPERS_JSON: &str = r#"
    [
        {
            "title": "X",
            "issued": { "date-parts": [[2020]] },
            "publisher": { "name": "ACM" },
            "author": [{ "given": "Machado de", "family": "Assis" }],
            "container-title": "CACM",
            "DOI": "10.1/x"
        },
        {
            "title": "X",
            "issued": { "date-parts": [[2020]] },
            "DOI": "10.1/y"
        },
        {
            "title": "No year",
            "issued": { "date-parts": [] }
        }
    ]
    "#;

    #[tokio::test]
    async fn test_populate_papers_counts_outcomes() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(PAPERS_JSON.as_bytes()).expect("Failed to write fixture");

        let summary = populate_papers(db.pool(), file.path()).await.expect("import failed");

        // One created, the duplicate (title, year) skipped, the yearless one failed
        assert_eq!(
            summary,
            ImportSummary {
                created: 1,
                existing: 1,
                failed: 1
            }
        );

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Document")
            .fetch_one(db.pool())
            .await
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_malformed_file_aborts() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"{ not json ]").expect("Failed to write fixture");

        let result = populate_books(db.pool(), file.path()).await;
        assert!(result.is_err());
    }
}
