//! User Storage
//! Mission: Create and look up user nodes under a unique-email constraint

use crate::auth::models::{StoredUser, UserRecord};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("constraint violated on field `{field}`")]
    ConstraintViolation { field: &'static str },
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Store contract the auth service depends on.
///
/// Implementations assign the user id themselves and must enforce email
/// uniqueness atomically with the insert.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: &str,
    ) -> Result<UserRecord, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<StoredUser, StoreError>;
}

/// In-process store keyed by email
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write();
        if users.contains_key(email) {
            return Err(StoreError::ConstraintViolation { field: "email" });
        }

        let user = StoredUser {
            user_id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            password: hashed_password.to_string(),
        };
        let record = UserRecord::from(&user);
        users.insert(email.to_string(), user);
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<StoredUser, StoreError> {
        self.users
            .read()
            .get(email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// User storage with SQLite backend
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Open (or create) the database and initialize the schema
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open user database at {db_path}"))?;
        Self::init_db(&conn)?;
        info!("User store opened at {}", db_path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Database that lives only as long as this store
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_db(conn: &Connection) -> anyhow::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create users table")?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// The lock is taken inside the blocking task, so waiting on it never
    /// parks a runtime worker.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .context("SQLite task failed")?
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        name: &str,
    ) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            user_id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        let hashed_password = hashed_password.to_string();

        let record = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO users (user_id, email, name, password, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        record.user_id,
                        record.email,
                        record.name,
                        hashed_password,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(|e| {
                    if is_constraint_violation(&e) {
                        StoreError::ConstraintViolation { field: "email" }
                    } else {
                        StoreError::Backend(anyhow::Error::new(e).context("Failed to insert user"))
                    }
                })?;
                Ok(record)
            })
            .await?;

        debug!(user_id = %record.user_id, "Inserted user row");
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<StoredUser, StoreError> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT user_id, email, name, password FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(StoredUser {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        password: row.get(3)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user by email")?
            .ok_or(StoreError::NotFound)
        })
        .await
    }
}
