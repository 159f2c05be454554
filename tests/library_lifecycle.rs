//! Integration test: full lifecycle against a file-backed database.
//!
//! Walks the same path the shell does: register and log in, insert a
//! book and a paper sharing a publisher and an author, read everything
//! back through the join queries, relink, update, delete.

use bibman::storage::models::{
    DocumentDetail, DocumentKind, NewAuthor, NewBook, NewPaper, NewPublisher, NewUser,
};
use bibman::storage::{queries, users, Database};
use bibman::Error;

fn abril() -> NewPublisher {
    NewPublisher {
        name: "Editora Abril".to_string(),
        address: Some("São Paulo - SP".to_string()),
        url: Some("https://www.abril.com.br/".to_string()),
    }
}

fn machado() -> NewAuthor {
    let mut author = NewAuthor::new("Assis".to_string(), "Machado de".to_string());
    author.birth_date = chrono::NaiveDate::from_ymd_opt(1839, 6, 21);
    author.email = Some("machado@example.com".to_string());
    author.nationality = Some("brazilian".to_string());
    author
}

#[tokio::test]
async fn full_library_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(dir.path().join("library.db")).await?;
    let pool = db.pool();

    // Register and log in
    let user = NewUser {
        username: "owner".to_string(),
        password: "secret".to_string(),
        email: None,
    };
    users::create_user(pool, &user).await?;
    let logged_in = users::authenticate(pool, "owner", "secret").await?;
    assert_eq!(logged_in.username, "owner");

    // Insert a book and a paper sharing publisher and author
    let mut book = NewBook::new("Dom Casmurro".to_string(), 1899);
    book.isbn = Some("978-85-359-0277-5".to_string());
    book.publication_place = Some("Rio de Janeiro".to_string());
    book.publisher = Some(abril());
    book.authors = vec![machado()];
    let book_id = queries::insert_book(pool, &book).await?;
    assert!(book_id.created);

    let mut paper = NewPaper::new("Memórias Póstumas, Revisited".to_string(), 1995);
    paper.doi = Some("10.1000/mp.1995".to_string());
    paper.journal = Some("Revista de Letras".to_string());
    paper.publisher = Some(abril());
    paper.authors = vec![machado(), NewAuthor::new("Doe".to_string(), "Jane".to_string())];
    let paper_id = queries::insert_paper(pool, &paper).await?;
    assert!(paper_id.created);

    // Shared reference data was resolved, not duplicated
    let publishers = queries::list_publishers(pool).await?;
    assert_eq!(publishers.len(), 1);
    let authors = queries::list_authors(pool).await?;
    assert_eq!(authors.len(), 2);

    // Polymorphic reads dispatch on the discriminator
    let fetched = queries::get_document_by_id(pool, book_id.document_id)
        .await?
        .expect("book missing");
    assert_eq!(fetched.kind(), DocumentKind::Book);
    assert_eq!(fetched.as_book().unwrap().isbn.as_deref(), Some("978-85-359-0277-5"));
    assert_eq!(fetched.authors.len(), 1);

    let fetched = queries::get_document_by_id(pool, paper_id.document_id)
        .await?
        .expect("paper missing");
    assert_eq!(fetched.kind(), DocumentKind::Paper);
    assert_eq!(fetched.authors.len(), 2);

    // Reverse indexes
    let publisher = queries::get_publisher_by_id(pool, publishers[0].publisher_id)
        .await?
        .expect("publisher missing");
    assert_eq!(
        publisher.document_ids,
        vec![book_id.document_id, paper_id.document_id]
    );

    let machado_row = authors
        .iter()
        .find(|a| a.last_name == "Assis")
        .expect("author missing");
    let by_author = queries::get_documents_by_author(pool, machado_row.author_id).await?;
    assert_eq!(by_author.len(), 2);

    // Update flows through to the subtype row
    let mut doc = queries::get_document_by_id(pool, book_id.document_id)
        .await?
        .expect("book missing");
    if let DocumentDetail::Book(detail) = &mut doc.detail {
        detail.edition = Some("2nd".to_string());
    }
    queries::update_document(pool, &doc).await?;
    let updated = queries::get_document_by_id(pool, book_id.document_id)
        .await?
        .expect("book missing");
    assert_eq!(updated.as_book().unwrap().edition.as_deref(), Some("2nd"));

    // Delete the paper; the book and the reference data survive
    queries::delete_document(pool, paper_id.document_id).await?;
    assert!(queries::get_document_by_id(pool, paper_id.document_id).await?.is_none());
    assert!(queries::get_document_by_id(pool, book_id.document_id).await?.is_some());
    assert_eq!(queries::list_authors(pool).await?.len(), 2);

    // Deleting again reports failure without touching anything
    let err = queries::delete_document(pool, paper_id.document_id)
        .await
        .expect_err("second delete must fail");
    assert!(matches!(err, Error::RecordNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn duplicate_scenario_from_the_field() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new_in_memory().await?;
    let pool = db.pool();

    // Same publisher twice: same id both times
    let first = queries::insert_publisher(pool, &NewPublisher::new("ACM".to_string())).await?;
    let second = queries::insert_publisher(pool, &NewPublisher::new("ACM".to_string())).await?;
    assert_eq!(first, second);

    // Same (title, year) twice with different doi: second insert reuses
    // the first row and leaves its doi alone
    let mut paper = NewPaper::new("X".to_string(), 2020);
    paper.doi = Some("10.1/x".to_string());
    let first = queries::insert_paper(pool, &paper).await?;
    assert!(first.created);

    paper.doi = Some("10.1/y".to_string());
    let second = queries::insert_paper(pool, &paper).await?;
    assert!(!second.created);
    assert_eq!(first.document_id, second.document_id);

    let stored = queries::get_document_by_id(pool, first.document_id)
        .await?
        .expect("paper missing");
    assert_eq!(stored.as_paper().unwrap().doi.as_deref(), Some("10.1/x"));

    Ok(())
}
