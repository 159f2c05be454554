//! CSL-JSON payload types and conversion
//!
//! The import format is an array of CSL ("citeproc") items. Only the
//! fields the data model stores are decoded; everything else in the
//! payload is ignored. Decoding is typed end to end, so a malformed item
//! is a deserialization error for the whole file rather than a crash
//! halfway through an insert.

use crate::error::{Error, Result};
use crate::storage::models::{NewAuthor, NewBook, NewPaper, NewPublisher};
use serde::Deserialize;
use std::path::Path;

/// One bibliographic item in a CSL-JSON array
#[derive(Debug, Clone, Deserialize)]
pub struct CslItem {
    pub title: String,
    pub language: Option<String>,
    pub issued: CslDate,
    pub publisher: Option<CslPublisher>,
    #[serde(default)]
    pub author: Vec<CslName>,

    // Paper fields
    #[serde(rename = "container-title")]
    pub container_title: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "DOI")]
    pub doi: Option<String>,

    // Book fields
    #[serde(rename = "publisher-place")]
    pub publisher_place: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    pub edition: Option<String>,
}

/// CSL date: nested date-parts, [[year, month, day]] with the inner
/// fields optional
#[derive(Debug, Clone, Deserialize)]
pub struct CslDate {
    #[serde(rename = "date-parts")]
    pub date_parts: Vec<Vec<i64>>,
}

impl CslDate {
    /// First element of the first date-parts entry
    pub fn year(&self) -> Option<i64> {
        self.date_parts.first().and_then(|parts| parts.first()).copied()
    }
}

/// CSL author name, split given/family
#[derive(Debug, Clone, Deserialize)]
pub struct CslName {
    pub given: Option<String>,
    pub family: String,
}

/// Publisher object carried by the import payload
#[derive(Debug, Clone, Deserialize)]
pub struct CslPublisher {
    pub name: String,
    pub address: Option<String>,
    pub url: Option<String>,
}

impl CslItem {
    fn year(&self) -> Result<i64> {
        self.issued.year().ok_or_else(|| {
            Error::ImportFailed(format!("'{}' has an empty issued date", self.title))
        })
    }

    fn publisher(&self) -> Option<NewPublisher> {
        self.publisher.as_ref().map(|p| NewPublisher {
            name: p.name.clone(),
            address: p.address.clone(),
            url: p.url.clone(),
        })
    }

    fn authors(&self) -> Vec<NewAuthor> {
        self.author
            .iter()
            .map(|name| NewAuthor {
                last_name: name.family.clone(),
                remaining_name: name.given.clone().unwrap_or_default(),
                birth_date: None,
                email: None,
                social_url: None,
                nationality: None,
            })
            .collect()
    }

    /// Convert into a book insert record
    pub fn into_new_book(self) -> Result<NewBook> {
        Ok(NewBook {
            year: self.year()?,
            publisher: self.publisher(),
            authors: self.authors(),
            title: self.title,
            language: self.language,
            isbn: self.isbn,
            edition: self.edition,
            publication_place: self.publisher_place,
        })
    }

    /// Convert into a paper insert record
    pub fn into_new_paper(self) -> Result<NewPaper> {
        Ok(NewPaper {
            year: self.year()?,
            publisher: self.publisher(),
            authors: self.authors(),
            title: self.title,
            language: self.language,
            doi: self.doi,
            journal: self.container_title,
            issue: self.issue,
            pages: self.page,
            volume: self.volume,
        })
    }
}

/// Read a CSL-JSON array from a file
pub fn read_items<P: AsRef<Path>>(path: P) -> Result<Vec<CslItem>> {
    let data = std::fs::read_to_string(path)?;
    let items: Vec<CslItem> = serde_json::from_str(&data)?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER_JSON: &str = r#"
    [{
        "title": "X",
        "language": "en",
        "issued": { "date-parts": [[2020, 4]] },
        "publisher": { "name": "ACM", "address": "New York, NY", "url": "https://www.acm.org" },
        "author": [
            { "given": "Machado de", "family": "Assis" },
            { "family": "Doe" }
        ],
        "container-title": "CACM",
        "volume": "63",
        "issue": "4",
        "page": "1-12",
        "DOI": "10.1/x"
    }]
    "#;

    const BOOK_JSON: &str = r#"
    [{
        "title": "Dom Casmurro",
        "language": "pt",
        "issued": { "date-parts": [[1899]] },
        "publisher": { "name": "Garnier" },
        "author": [{ "given": "Machado de", "family": "Assis" }],
        "publisher-place": "Rio de Janeiro",
        "ISBN": "978-85-359-0277-5",
        "edition": "1st"
    }]
    "#;

    #[test]
    fn test_paper_item_conversion() {
        let items: Vec<CslItem> = serde_json::from_str(PAPER_JSON).expect("parse failed");
        let paper = items
            .into_iter()
            .next()
            .unwrap()
            .into_new_paper()
            .expect("conversion failed");

        assert_eq!(paper.title, "X");
        assert_eq!(paper.year, 2020);
        assert_eq!(paper.doi.as_deref(), Some("10.1/x"));
        assert_eq!(paper.journal.as_deref(), Some("CACM"));
        assert_eq!(paper.pages.as_deref(), Some("1-12"));
        assert_eq!(paper.publisher.as_ref().map(|p| p.name.as_str()), Some("ACM"));
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.authors[0].remaining_name, "Machado de");
        assert_eq!(paper.authors[0].last_name, "Assis");
        // Missing given name becomes an empty remaining_name, not a skip
        assert_eq!(paper.authors[1].remaining_name, "");
    }

    #[test]
    fn test_book_item_conversion() {
        let items: Vec<CslItem> = serde_json::from_str(BOOK_JSON).expect("parse failed");
        let book = items
            .into_iter()
            .next()
            .unwrap()
            .into_new_book()
            .expect("conversion failed");

        assert_eq!(book.title, "Dom Casmurro");
        assert_eq!(book.year, 1899);
        assert_eq!(book.isbn.as_deref(), Some("978-85-359-0277-5"));
        assert_eq!(book.publication_place.as_deref(), Some("Rio de Janeiro"));
        assert_eq!(book.edition.as_deref(), Some("1st"));
    }

    #[test]
    fn test_empty_date_parts_is_an_error() {
        let json = r#"[{ "title": "No date", "issued": { "date-parts": [] } }]"#;
        let items: Vec<CslItem> = serde_json::from_str(json).expect("parse failed");
        let err = items
            .into_iter()
            .next()
            .unwrap()
            .into_new_book()
            .expect_err("missing year should fail");
        assert!(matches!(err, Error::ImportFailed(_)));
    }

    #[test]
    fn test_missing_issued_is_a_parse_error() {
        let json = r#"[{ "title": "No issued at all" }]"#;
        let result: std::result::Result<Vec<CslItem>, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
