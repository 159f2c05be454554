//! bibman - personal bibliography manager
//!
//! Stores publishers, documents (books and papers), authors and users in
//! SQLite and exposes the data-access operations the interactive shell
//! is built on. The interesting part is `storage`: a hand-rolled mapping
//! of the polymorphic Book/Paper document hierarchy onto normalized
//! tables, with natural-key identity resolution and transactional
//! multi-table inserts and deletes.

pub mod error;
pub mod import;
pub mod logger;
pub mod storage;

pub use error::{Error, Result};
