use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use shared::{
    domain::{Role, SignupId, SignupRecord, SignupStatus},
    protocol::SignupReceipt,
    validation::{normalize_email, NewSignup},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("{0}")]
    PersistenceFailed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::PersistenceFailed(err.to_string())
    }
}

/// Persistence contract for waitlist signups.
#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Create a signup and assign it the next waitlist position.
    async fn insert(&self, signup: NewSignup) -> Result<SignupReceipt, StoreError>;
    /// Remove every signup for `email`. Returns how many rows went away; zero is not an error.
    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError>;
    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StoreError>;
    async fn count_signups(&self) -> Result<u64, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run waitlist migrations")?;
        info!(%database_url, "signup store ready");
        Ok(Self { pool })
    }

    async fn insert_signup(&self, signup: NewSignup) -> Result<SignupReceipt, StoreError> {
        let email = normalize_email(&signup.email);
        let id = SignupId::new_v4();
        let created_at = Utc::now();

        // The first statement writes, so the transaction holds the write lock
        // before the counter is read.
        let mut tx = self.pool.begin().await?;
        let signup_position: i64 = sqlx::query_scalar(
            "UPDATE waitlist_sequence SET last_position = last_position + 1
             WHERE id = 1
             RETURNING last_position",
        )
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO waitlist_signups
                (id, email, name, role, organization, signup_position, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(&email)
        .bind(signup.name.as_deref())
        .bind(signup.role.as_str())
        .bind(&signup.organization)
        .bind(signup_position)
        .bind(SignupStatus::Pending.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(%email, "duplicate waitlist signup rejected");
                tx.rollback().await?;
                return Err(StoreError::DuplicateEmail);
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;
        Ok(SignupReceipt {
            id,
            email,
            signup_position,
        })
    }
}

#[async_trait]
impl SignupStore for Storage {
    async fn insert(&self, signup: NewSignup) -> Result<SignupReceipt, StoreError> {
        self.insert_signup(signup).await
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM waitlist_signups WHERE email = ?")
            .bind(normalize_email(email))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_signups(&self) -> Result<Vec<SignupRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, email, name, role, organization, signup_position, status, created_at
             FROM waitlist_signups
             ORDER BY signup_position ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(signup_from_row).collect()
    }

    async fn count_signups(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist_signups")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let _: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

fn signup_from_row(row: &SqliteRow) -> Result<SignupRecord, StoreError> {
    let corrupt = |what: &str, detail: String| {
        StoreError::PersistenceFailed(format!("corrupt {what} in waitlist_signups: {detail}"))
    };

    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(SignupRecord {
        id: SignupId(Uuid::parse_str(&id).map_err(|e| corrupt("id", e.to_string()))?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role: Role::from_str(&role).map_err(|e| corrupt("role", e.to_string()))?,
        organization: row.try_get("organization")?,
        signup_position: row.try_get("signup_position")?,
        status: SignupStatus::from_str(&status).map_err(|e| corrupt("status", e))?,
        created_at,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
