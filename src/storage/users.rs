// Bibman - Personal Bibliography Manager
// Copyright (C) 2026 Bibman contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! User storage operations
//!
//! Registration and login for the shell. Passwords are stored and
//! compared as plain text; this is a local single-user tool and the User
//! table exists for menu gating, not for security.

use crate::error::{Error, Result};
use crate::storage::models::{NewUser, User};
use sqlx::SqlitePool;

/// Register a new user
///
/// Unlike the bibliographic natural keys, a taken username is a real
/// error: registration must not silently log the caller into somebody
/// else's row.
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<i64> {
    let result = sqlx::query("INSERT INTO User (username, password, email) VALUES (?, ?, ?)")
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .execute(pool)
        .await;

    match result {
        Ok(r) => Ok(r.last_insert_rowid()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(Error::UsernameTaken(user.username.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Find user by username
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM User WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Find user by id
pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM User WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Check a username/password pair
///
/// Plaintext comparison. Unknown username and wrong password are the
/// same error, so the prompt leaks nothing about which usernames exist.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<User> {
    let user = get_user_by_username(pool, username).await?;

    match user {
        Some(user) if user.password == password => Ok(user),
        _ => Err(Error::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            email: Some("alice@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let user_id = create_user(db.pool(), &alice()).await.expect("register failed");
        assert!(user_id > 0);

        let user = authenticate(db.pool(), "alice", "hunter2").await.expect("login failed");
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        create_user(db.pool(), &alice()).await.expect("register failed");
        let err = create_user(db.pool(), &alice()).await.expect_err("duplicate should fail");
        assert!(matches!(err, Error::UsernameTaken(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        create_user(db.pool(), &alice()).await.expect("register failed");

        let err = authenticate(db.pool(), "alice", "wrong").await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidCredentials));

        let err = authenticate(db.pool(), "bob", "hunter2").await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidCredentials));
    }
}
