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

//! Interactive shell: a numbered menu over the data-access layer.
//! Session state is one optional logged-in user; mutations require it,
//! reads do not. Errors are printed and the loop continues.

use bibman::storage::models::{
    Author, Document, DocumentDetail, NewAuthor, NewBook, NewPaper, NewPublisher, NewUser,
    Publisher, User,
};
use bibman::storage::{queries, users, Database};
use bibman::{import, logger};
use chrono::NaiveDate;
use clap::Parser;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use sqlx::SqlitePool;

#[derive(Parser)]
#[command(name = "bibman")]
#[command(version, about = "Personal bibliography manager", long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, value_name = "FILE", default_value = "bibman.db")]
    database: std::path::PathBuf,

    /// Path to the log file
    #[arg(long, value_name = "FILE", default_value = "bibman.log")]
    log_file: String,
}

struct Session {
    user: Option<User>,
}

impl Session {
    fn require_login(&self) -> Option<&User> {
        if self.user.is_none() {
            println!("{} You must be logged in to do that.", style("✘").red());
        }
        self.user.as_ref()
    }
}

const MENU: &str = "
 1) Register                 2) Login                    3) Logout
 4) Add publisher            5) Add author               6) Add book
 7) Add paper                8) Show document            9) Show publisher
10) Show author             11) List books              12) List papers
13) List publishers         14) List authors            15) Documents by author
16) Documents by publisher  17) Update publisher        18) Update author
19) Update document         20) Delete publisher        21) Delete author
22) Delete document         23) Link author to document 24) Set document publisher
25) Import books (CSL)      26) Import papers (CSL)      0) Exit
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init(&cli.log_file)?;
    let db = Database::new(&cli.database).await?;
    log::info!("opened database at {}", cli.database.display());

    println!("{}", style("bibman - personal bibliography manager").bold());

    let mut session = Session { user: None };

    loop {
        println!("{MENU}");
        let choice: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("choice")
            .interact_text()?;

        let result = match choice.trim() {
            "0" => break,
            "1" => register(db.pool()).await,
            "2" => login(db.pool(), &mut session).await,
            "3" => logout(&mut session),
            "4" => add_publisher(db.pool(), &session).await,
            "5" => add_author(db.pool(), &session).await,
            "6" => add_book(db.pool(), &session).await,
            "7" => add_paper(db.pool(), &session).await,
            "8" => show_document(db.pool()).await,
            "9" => show_publisher(db.pool()).await,
            "10" => show_author(db.pool()).await,
            "11" => list_documents(queries::get_books(db.pool()).await),
            "12" => list_documents(queries::get_papers(db.pool()).await),
            "13" => list_publishers(db.pool()).await,
            "14" => list_authors(db.pool()).await,
            "15" => documents_by_author(db.pool()).await,
            "16" => documents_by_publisher(db.pool()).await,
            "17" => update_publisher(db.pool(), &session).await,
            "18" => update_author(db.pool(), &session).await,
            "19" => update_document(db.pool(), &session).await,
            "20" => delete_publisher(db.pool(), &session).await,
            "21" => delete_author(db.pool(), &session).await,
            "22" => delete_document(db.pool(), &session).await,
            "23" => link_author(db.pool(), &session).await,
            "24" => set_document_publisher(db.pool(), &session).await,
            "25" => import_file(db.pool(), &session, true).await,
            "26" => import_file(db.pool(), &session, false).await,
            _ => {
                println!("{} Unknown option.", style("✘").red());
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("{} {e}", style("✘").red());
        }
    }

    println!("Bye.");
    Ok(())
}

// ============================================================================
// PROMPT HELPERS
// ============================================================================

fn prompt(label: &str) -> anyhow::Result<String> {
    Ok(Input::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .interact_text()?)
}

fn prompt_default(label: &str, default: String) -> anyhow::Result<String> {
    Ok(Input::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .default(default)
        .interact_text()?)
}

/// Empty input means "no value"
fn prompt_opt(label: &str) -> anyhow::Result<Option<String>> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{label} (optional)"))
        .allow_empty(true)
        .interact_text()?;
    Ok(if value.trim().is_empty() {
        None
    } else {
        Some(value)
    })
}

fn prompt_opt_default(label: &str, default: Option<String>) -> anyhow::Result<Option<String>> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{label} (optional)"))
        .default(default.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    Ok(if value.trim().is_empty() {
        None
    } else {
        Some(value)
    })
}

fn prompt_id(label: &str) -> anyhow::Result<i64> {
    Ok(Input::<i64>::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .interact_text()?)
}

fn prompt_opt_date(label: &str) -> anyhow::Result<Option<NaiveDate>> {
    loop {
        let value: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{label} (YYYY-MM-DD, optional)"))
            .allow_empty(true)
            .interact_text()?;
        if value.trim().is_empty() {
            return Ok(None);
        }
        match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(date) => return Ok(Some(date)),
            Err(_) => println!("{} Not a valid date.", style("✘").red()),
        }
    }
}

/// Collect authors until an empty last name is entered
fn prompt_authors() -> anyhow::Result<Vec<NewAuthor>> {
    let mut authors = Vec::new();
    loop {
        let last: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Author last name (empty to finish)")
            .allow_empty(true)
            .interact_text()?;
        if last.trim().is_empty() {
            break;
        }
        let remaining: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Author remaining name")
            .allow_empty(true)
            .interact_text()?;
        authors.push(NewAuthor::new(last, remaining));
    }
    Ok(authors)
}

/// Empty publisher name means "no publisher"
fn prompt_publisher() -> anyhow::Result<Option<NewPublisher>> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Publisher name (empty for none)")
        .allow_empty(true)
        .interact_text()?;
    if name.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(NewPublisher {
        name,
        address: prompt_opt("Publisher address")?,
        url: prompt_opt("Publisher url")?,
    }))
}

// ============================================================================
// DISPLAY HELPERS
// ============================================================================

fn print_document(doc: &Document) {
    let publisher = doc
        .publisher
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("-");
    let authors = doc
        .authors
        .iter()
        .map(Author::full_name)
        .collect::<Vec<_>>()
        .join(", ");

    println!(
        "#{} [{}] {} ({})",
        doc.document_id,
        doc.kind(),
        style(&doc.title).bold(),
        doc.year
    );
    let authors: &str = if authors.is_empty() { "-" } else { &authors };
    println!("    publisher: {publisher}   authors: {authors}");
    match &doc.detail {
        DocumentDetail::Book(book) => println!(
            "    isbn: {}   edition: {}   place: {}",
            book.isbn.as_deref().unwrap_or("-"),
            book.edition.as_deref().unwrap_or("-"),
            book.publication_place.as_deref().unwrap_or("-"),
        ),
        DocumentDetail::Paper(paper) => println!(
            "    doi: {}   journal: {}   vol/issue: {}/{}   pages: {}",
            paper.doi.as_deref().unwrap_or("-"),
            paper.journal.as_deref().unwrap_or("-"),
            paper.volume.as_deref().unwrap_or("-"),
            paper.issue.as_deref().unwrap_or("-"),
            paper.pages.as_deref().unwrap_or("-"),
        ),
    }
}

fn print_publisher(publisher: &Publisher) {
    println!(
        "#{} {}   address: {}   url: {}",
        publisher.publisher_id,
        style(&publisher.name).bold(),
        publisher.address.as_deref().unwrap_or("-"),
        publisher.url.as_deref().unwrap_or("-"),
    );
}

fn print_author(author: &Author) {
    println!(
        "#{} {}   born: {}   email: {}   nationality: {}",
        author.author_id,
        style(author.full_name()).bold(),
        author
            .birth_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        author.email.as_deref().unwrap_or("-"),
        author.nationality.as_deref().unwrap_or("-"),
    );
}

// ============================================================================
// SESSION ACTIONS
// ============================================================================

async fn register(pool: &SqlitePool) -> anyhow::Result<()> {
    let user = NewUser {
        username: prompt("Username")?,
        password: Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?,
        email: prompt_opt("Email")?,
    };
    let user_id = users::create_user(pool, &user).await?;
    println!("{} Registered user #{user_id}.", style("✔").green());
    Ok(())
}

async fn login(pool: &SqlitePool, session: &mut Session) -> anyhow::Result<()> {
    let username = prompt("Username")?;
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()?;
    let user = users::authenticate(pool, &username, &password).await?;
    println!("{} Logged in as {}.", style("✔").green(), user.username);
    session.user = Some(user);
    Ok(())
}

fn logout(session: &mut Session) -> anyhow::Result<()> {
    match session.user.take() {
        Some(user) => println!("{} Logged out {}.", style("✔").green(), user.username),
        None => println!("Not logged in."),
    }
    Ok(())
}

// ============================================================================
// INSERT ACTIONS
// ============================================================================

async fn add_publisher(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let publisher = NewPublisher {
        name: prompt("Name")?,
        address: prompt_opt("Address")?,
        url: prompt_opt("Url")?,
    };
    let publisher_id = queries::insert_publisher(pool, &publisher).await?;
    println!("{} Publisher #{publisher_id}.", style("✔").green());
    Ok(())
}

async fn add_author(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let author = NewAuthor {
        last_name: prompt("Last name")?,
        remaining_name: prompt("Remaining name")?,
        birth_date: prompt_opt_date("Birth date")?,
        email: prompt_opt("Email")?,
        social_url: prompt_opt("Social url")?,
        nationality: prompt_opt("Nationality")?,
    };
    let mut conn = pool.acquire().await?;
    let author_id = queries::insert_author(&mut conn, &author, None).await?;
    println!("{} Author #{author_id}.", style("✔").green());
    Ok(())
}

async fn add_book(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let book = NewBook {
        title: prompt("Title")?,
        year: prompt_id("Year")?,
        language: prompt_opt("Language")?,
        isbn: prompt_opt("ISBN")?,
        edition: prompt_opt("Edition")?,
        publication_place: prompt_opt("Publication place")?,
        publisher: prompt_publisher()?,
        authors: prompt_authors()?,
    };
    let inserted = queries::insert_book(pool, &book).await?;
    if inserted.created {
        println!("{} Book #{}.", style("✔").green(), inserted.document_id);
    } else {
        println!(
            "This document already exists as #{}.",
            inserted.document_id
        );
    }
    Ok(())
}

async fn add_paper(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let paper = NewPaper {
        title: prompt("Title")?,
        year: prompt_id("Year")?,
        language: prompt_opt("Language")?,
        doi: prompt_opt("DOI")?,
        journal: prompt_opt("Journal")?,
        volume: prompt_opt("Volume")?,
        issue: prompt_opt("Issue")?,
        pages: prompt_opt("Pages")?,
        publisher: prompt_publisher()?,
        authors: prompt_authors()?,
    };
    let inserted = queries::insert_paper(pool, &paper).await?;
    if inserted.created {
        println!("{} Paper #{}.", style("✔").green(), inserted.document_id);
    } else {
        println!(
            "This document already exists as #{}.",
            inserted.document_id
        );
    }
    Ok(())
}

// ============================================================================
// READ ACTIONS
// ============================================================================

async fn show_document(pool: &SqlitePool) -> anyhow::Result<()> {
    let document_id = prompt_id("Document id")?;
    match queries::get_document_by_id(pool, document_id).await? {
        Some(doc) => print_document(&doc),
        None => println!("No document #{document_id}."),
    }
    Ok(())
}

async fn show_publisher(pool: &SqlitePool) -> anyhow::Result<()> {
    let publisher_id = prompt_id("Publisher id")?;
    match queries::get_publisher_by_id(pool, publisher_id).await? {
        Some(found) => {
            print_publisher(&found.publisher);
            println!("    documents: {:?}", found.document_ids);
        }
        None => println!("No publisher #{publisher_id}."),
    }
    Ok(())
}

async fn show_author(pool: &SqlitePool) -> anyhow::Result<()> {
    let author_id = prompt_id("Author id")?;
    match queries::get_author_by_id(pool, author_id).await? {
        Some(found) => {
            print_author(&found.author);
            println!("    documents: {:?}", found.document_ids);
        }
        None => println!("No author #{author_id}."),
    }
    Ok(())
}

fn list_documents(documents: bibman::Result<Vec<Document>>) -> anyhow::Result<()> {
    let documents = documents?;
    if documents.is_empty() {
        println!("Nothing stored yet.");
    }
    for doc in &documents {
        print_document(doc);
    }
    Ok(())
}

async fn list_publishers(pool: &SqlitePool) -> anyhow::Result<()> {
    for publisher in queries::list_publishers(pool).await? {
        print_publisher(&publisher);
    }
    Ok(())
}

async fn list_authors(pool: &SqlitePool) -> anyhow::Result<()> {
    for author in queries::list_authors(pool).await? {
        print_author(&author);
    }
    Ok(())
}

async fn documents_by_author(pool: &SqlitePool) -> anyhow::Result<()> {
    let author_id = prompt_id("Author id")?;
    list_documents(queries::get_documents_by_author(pool, author_id).await)
}

async fn documents_by_publisher(pool: &SqlitePool) -> anyhow::Result<()> {
    let publisher_id = prompt_id("Publisher id")?;
    list_documents(queries::get_documents_by_publisher(pool, publisher_id).await)
}

// ============================================================================
// UPDATE ACTIONS
// ============================================================================

async fn update_publisher(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let publisher_id = prompt_id("Publisher id")?;
    let Some(found) = queries::get_publisher_by_id(pool, publisher_id).await? else {
        println!("No publisher #{publisher_id}.");
        return Ok(());
    };
    let mut publisher = found.publisher;
    publisher.name = prompt_default("Name", publisher.name.clone())?;
    publisher.address = prompt_opt_default("Address", publisher.address.clone())?;
    publisher.url = prompt_opt_default("Url", publisher.url.clone())?;

    queries::update_publisher(pool, &publisher).await?;
    println!("{} Updated.", style("✔").green());
    Ok(())
}

async fn update_author(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let author_id = prompt_id("Author id")?;
    let Some(found) = queries::get_author_by_id(pool, author_id).await? else {
        println!("No author #{author_id}.");
        return Ok(());
    };
    let mut author = found.author;
    author.last_name = prompt_default("Last name", author.last_name.clone())?;
    author.remaining_name = prompt_default("Remaining name", author.remaining_name.clone())?;
    if let Some(date) = prompt_opt_date("Birth date")? {
        author.birth_date = Some(date);
    }
    author.email = prompt_opt_default("Email", author.email.clone())?;
    author.social_url = prompt_opt_default("Social url", author.social_url.clone())?;
    author.nationality = prompt_opt_default("Nationality", author.nationality.clone())?;

    queries::update_author(pool, &author).await?;
    println!("{} Updated.", style("✔").green());
    Ok(())
}

async fn update_document(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let document_id = prompt_id("Document id")?;
    let Some(mut doc) = queries::get_document_by_id(pool, document_id).await? else {
        println!("No document #{document_id}.");
        return Ok(());
    };

    doc.title = prompt_default("Title", doc.title.clone())?;
    doc.year = Input::<i64>::with_theme(&ColorfulTheme::default())
        .with_prompt("Year")
        .default(doc.year)
        .interact_text()?;
    doc.language = prompt_opt_default("Language", doc.language.clone())?;

    match &mut doc.detail {
        DocumentDetail::Book(book) => {
            book.isbn = prompt_opt_default("ISBN", book.isbn.clone())?;
            book.edition = prompt_opt_default("Edition", book.edition.clone())?;
            book.publication_place =
                prompt_opt_default("Publication place", book.publication_place.clone())?;
        }
        DocumentDetail::Paper(paper) => {
            paper.doi = prompt_opt_default("DOI", paper.doi.clone())?;
            paper.journal = prompt_opt_default("Journal", paper.journal.clone())?;
            paper.volume = prompt_opt_default("Volume", paper.volume.clone())?;
            paper.issue = prompt_opt_default("Issue", paper.issue.clone())?;
            paper.pages = prompt_opt_default("Pages", paper.pages.clone())?;
        }
    }

    queries::update_document(pool, &doc).await?;
    println!("{} Updated.", style("✔").green());
    Ok(())
}

// ============================================================================
// DELETE / LINK ACTIONS
// ============================================================================

async fn delete_publisher(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let publisher_id = prompt_id("Publisher id")?;
    queries::delete_publisher(pool, publisher_id).await?;
    println!("{} Deleted; its documents are now unpublished.", style("✔").green());
    Ok(())
}

async fn delete_author(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let author_id = prompt_id("Author id")?;
    queries::delete_author(pool, author_id).await?;
    println!("{} Deleted.", style("✔").green());
    Ok(())
}

async fn delete_document(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let document_id = prompt_id("Document id")?;
    queries::delete_document(pool, document_id).await?;
    println!("{} Deleted.", style("✔").green());
    Ok(())
}

async fn link_author(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let document_id = prompt_id("Document id")?;
    let author_id = prompt_id("Author id")?;
    let mut conn = pool.acquire().await?;
    queries::link_author(&mut conn, document_id, author_id).await?;
    println!("{} Linked.", style("✔").green());
    Ok(())
}

async fn set_document_publisher(pool: &SqlitePool, session: &Session) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let document_id = prompt_id("Document id")?;
    let publisher_id = prompt_id("Publisher id")?;
    queries::set_document_publisher(pool, document_id, publisher_id).await?;
    println!("{} Publisher set.", style("✔").green());
    Ok(())
}

// ============================================================================
// IMPORT
// ============================================================================

async fn import_file(pool: &SqlitePool, session: &Session, books: bool) -> anyhow::Result<()> {
    if session.require_login().is_none() {
        return Ok(());
    }
    let path = prompt("Path to CSL-JSON file")?;
    let summary = if books {
        import::populate_books(pool, &path).await?
    } else {
        import::populate_papers(pool, &path).await?
    };
    println!(
        "{} Imported: {} created, {} already present, {} failed.",
        style("✔").green(),
        summary.created,
        summary.existing,
        summary.failed
    );
    Ok(())
}
