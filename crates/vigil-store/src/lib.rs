//! Vigil Storage Layer
//!
//! Implements the [`RelationshipStore`] trait on top of SQLite.
//!
//! # Architecture
//!
//! - SQLite for profiles and relationship edges
//! - Row-level rules (who may accept, reject or delete an edge) enforced here,
//!   the same way a hosted backend enforces them with row policies
//! - In-process change notification for subscribers
//!
//! # Examples
//!
//! ```no_run
//! use vigil_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for profile and edge operations
//! ```

#![warn(missing_docs)]

mod notify;

use async_trait::async_trait;
use notify::Subscribers;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use vigil_domain::traits::{ChangeCallback, ChangeKind, EdgeChange, RelationshipStore, Subscription};
use vigil_domain::{EdgeId, EdgeStatus, RelationshipEdge, RelationshipError, UserId, UserProfile};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the connection panicked
    #[error("Connection lock poisoned")]
    LockPoisoned,

    /// Rule violation reported to the caller as-is
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
}

impl From<StoreError> for RelationshipError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Relationship(inner) => inner,
            StoreError::InvalidData(msg) => RelationshipError::Invalid(msg),
            StoreError::Database(db) => RelationshipError::StoreUnavailable(db.to_string()),
            StoreError::LockPoisoned => RelationshipError::StoreUnavailable("lock poisoned".to_string()),
        }
    }
}

const EDGE_COLUMNS: &str = "id, requester_id, recipient_id, status, created_at, updated_at";

/// Current time in milliseconds since Unix epoch
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct Inner {
    conn: Connection,
    /// Last timestamp handed out; stamps are strictly increasing so that the
    /// most recent edge of a pair always wins the duplicate tie-break.
    last_stamp: u64,
}

impl Inner {
    fn next_stamp(&mut self) -> u64 {
        let stamp = current_timestamp_ms().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

/// SQLite-based implementation of [`RelationshipStore`]
///
/// # Thread Safety
///
/// The connection is guarded by a mutex, so one store can be shared across
/// tasks behind an `Arc`. Queries run on the calling task; they are local and
/// short.
pub struct SqliteStore {
    inner: Mutex<Inner>,
    subscribers: Subscribers,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;

        tracing::debug!(path = %path.display(), "Opened relationship database");

        let last_stamp: i64 = conn.query_row(
            "SELECT COALESCE(MAX(updated_at), 0) FROM relationship_edges",
            [],
            |row| row.get(0),
        )?;

        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                last_stamp: last_stamp.max(0) as u64,
            }),
            subscribers: Subscribers::default(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert a profile, or update its descriptive attributes if it exists
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let inner = self.lock()?;
        inner.conn.execute(
            "INSERT INTO profiles (id, display_name, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
             display_name = excluded.display_name, image_url = excluded.image_url",
            params![
                profile.id.to_bytes().as_slice(),
                &profile.display_name,
                &profile.image_url,
                current_timestamp_ms() as i64,
            ],
        )?;
        Ok(())
    }

    /// Get a profile by id
    pub fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let inner = self.lock()?;
        let profile = inner
            .conn
            .query_row(
                "SELECT id, display_name, image_url FROM profiles WHERE id = ?1",
                params![id.to_bytes().as_slice()],
                row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// Every profile, ordered by display name
    pub fn all_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.lock()?;
        let mut stmt = inner
            .conn
            .prepare("SELECT id, display_name, image_url FROM profiles ORDER BY display_name COLLATE NOCASE, id")?;
        let profiles = stmt.query_map([], row_to_profile)?.collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Profiles whose display name matches `name`, ignoring ASCII case
    pub fn find_profiles_by_name(&self, name: &str) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.lock()?;
        let mut stmt = inner.conn.prepare(
            "SELECT id, display_name, image_url FROM profiles
             WHERE display_name = ?1 COLLATE NOCASE ORDER BY id",
        )?;
        let profiles = stmt
            .query_map(params![name.trim()], row_to_profile)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Get an edge by id
    pub fn get_edge(&self, id: EdgeId) -> Result<Option<RelationshipEdge>, StoreError> {
        let inner = self.lock()?;
        Self::find_edge(&inner.conn, id)
    }

    /// Number of live change subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn find_edge(conn: &Connection, id: EdgeId) -> Result<Option<RelationshipEdge>, StoreError> {
        let edge = conn
            .query_row(
                &format!("SELECT {EDGE_COLUMNS} FROM relationship_edges WHERE id = ?1"),
                params![id.to_bytes().as_slice()],
                row_to_edge,
            )
            .optional()?;
        Ok(edge)
    }

    fn profile_exists(conn: &Connection, id: UserId) -> Result<bool, StoreError> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM profiles WHERE id = ?1",
                params![id.to_bytes().as_slice()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    fn insert_edge(&self, requester: UserId, recipient: UserId) -> Result<RelationshipEdge, StoreError> {
        if requester == recipient {
            return Err(RelationshipError::Invalid("cannot befriend oneself".into()).into());
        }

        let mut inner = self.lock()?;

        if !Self::profile_exists(&inner.conn, requester)? || !Self::profile_exists(&inner.conn, recipient)? {
            return Err(RelationshipError::NotFound.into());
        }

        let active: bool = inner
            .conn
            .query_row(
                "SELECT 1 FROM relationship_edges
                 WHERE status <> 'rejected'
                 AND ((requester_id = ?1 AND recipient_id = ?2) OR (requester_id = ?2 AND recipient_id = ?1))
                 LIMIT 1",
                params![requester.to_bytes().as_slice(), recipient.to_bytes().as_slice()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if active {
            return Err(RelationshipError::AlreadyExists.into());
        }

        let edge = RelationshipEdge::pending(requester, recipient, inner.next_stamp());
        inner.conn.execute(
            &format!("INSERT INTO relationship_edges ({EDGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                edge.id.to_bytes().as_slice(),
                edge.requester_id.to_bytes().as_slice(),
                edge.recipient_id.to_bytes().as_slice(),
                edge.status.as_str(),
                edge.created_at as i64,
                edge.updated_at as i64,
            ],
        )?;

        Ok(edge)
    }

    fn set_status(&self, id: EdgeId, status: EdgeStatus, acting: UserId) -> Result<RelationshipEdge, StoreError> {
        if status == EdgeStatus::Pending {
            return Err(RelationshipError::Invalid("an edge cannot be moved back to pending".into()).into());
        }

        let mut inner = self.lock()?;

        let mut edge = Self::find_edge(&inner.conn, id)?.ok_or(RelationshipError::NotFound)?;
        if edge.status != EdgeStatus::Pending {
            return Err(RelationshipError::NotFound.into());
        }
        if edge.recipient_id != acting {
            return Err(RelationshipError::NotAuthorized.into());
        }

        edge.status = status;
        edge.updated_at = inner.next_stamp();
        let affected = inner.conn.execute(
            "UPDATE relationship_edges SET status = ?2, updated_at = ?3
             WHERE id = ?1 AND status = 'pending'",
            params![id.to_bytes().as_slice(), status.as_str(), edge.updated_at as i64],
        )?;
        if affected != 1 {
            return Err(RelationshipError::NotFound.into());
        }

        Ok(edge)
    }

    /// Delete an edge, optionally only while it still has the `expected` status
    fn remove_edge(
        &self,
        id: EdgeId,
        expected: Option<EdgeStatus>,
        acting: UserId,
    ) -> Result<RelationshipEdge, StoreError> {
        let inner = self.lock()?;

        let edge = Self::find_edge(&inner.conn, id)?.ok_or(RelationshipError::NotFound)?;
        if expected.is_some_and(|status| edge.status != status) {
            return Err(RelationshipError::NotFound.into());
        }
        if !edge.involves(acting) {
            return Err(RelationshipError::NotAuthorized.into());
        }

        let affected = inner.conn.execute(
            "DELETE FROM relationship_edges WHERE id = ?1 AND status = ?2",
            params![id.to_bytes().as_slice(), edge.status.as_str()],
        )?;
        if affected != 1 {
            return Err(RelationshipError::NotFound.into());
        }

        Ok(edge)
    }
}

#[async_trait]
impl RelationshipStore for SqliteStore {
    async fn list_profiles(&self, excluding: UserId) -> Result<Vec<UserProfile>, RelationshipError> {
        let inner = self.lock()?;
        let mut stmt = inner
            .conn
            .prepare(
                "SELECT id, display_name, image_url FROM profiles
                 WHERE id <> ?1 ORDER BY display_name COLLATE NOCASE, id",
            )
            .map_err(StoreError::from)?;

        let profiles = stmt
            .query_map(params![excluding.to_bytes().as_slice()], row_to_profile)
            .map_err(StoreError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(profiles)
    }

    async fn list_edges_touching(&self, user: UserId) -> Result<Vec<RelationshipEdge>, RelationshipError> {
        let inner = self.lock()?;
        let mut stmt = inner
            .conn
            .prepare(&format!(
                "SELECT {EDGE_COLUMNS} FROM relationship_edges
                 WHERE requester_id = ?1 OR recipient_id = ?1
                 ORDER BY created_at, id"
            ))
            .map_err(StoreError::from)?;

        let edges = stmt
            .query_map(params![user.to_bytes().as_slice()], row_to_edge)
            .map_err(StoreError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(edges)
    }

    async fn create_edge(
        &self,
        requester: UserId,
        recipient: UserId,
    ) -> Result<RelationshipEdge, RelationshipError> {
        let edge = self.insert_edge(requester, recipient)?;
        self.subscribers.notify(&EdgeChange::of(&edge, ChangeKind::Created));
        Ok(edge)
    }

    async fn update_edge_status(
        &self,
        edge: EdgeId,
        status: EdgeStatus,
        acting: UserId,
    ) -> Result<RelationshipEdge, RelationshipError> {
        let edge = self.set_status(edge, status, acting)?;
        self.subscribers.notify(&EdgeChange::of(&edge, ChangeKind::Updated));
        Ok(edge)
    }

    async fn delete_edge(&self, edge: EdgeId, acting: UserId) -> Result<(), RelationshipError> {
        let removed = self.remove_edge(edge, None, acting)?;
        self.subscribers.notify(&EdgeChange::of(&removed, ChangeKind::Deleted));
        Ok(())
    }

    async fn delete_edge_in_status(
        &self,
        edge: EdgeId,
        status: EdgeStatus,
        acting: UserId,
    ) -> Result<RelationshipEdge, RelationshipError> {
        let removed = self.remove_edge(edge, Some(status), acting)?;
        self.subscribers.notify(&EdgeChange::of(&removed, ChangeKind::Deleted));
        Ok(removed)
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Option<Subscription> {
        Some(self.subscribers.add(on_change))
    }

    fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.remove(subscription);
    }
}

fn conversion_failure(index: usize, ty: rusqlite::types::Type, e: RelationshipError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(e))
}

fn user_id_at(row: &Row<'_>, index: usize) -> rusqlite::Result<UserId> {
    let bytes: Vec<u8> = row.get(index)?;
    UserId::from_bytes(&bytes).map_err(|e| conversion_failure(index, rusqlite::types::Type::Blob, e))
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: user_id_at(row, 0)?,
        display_name: row.get(1)?,
        image_url: row.get(2)?,
    })
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<RelationshipEdge> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let id = EdgeId::from_bytes(&id_bytes)
        .map_err(|e| conversion_failure(0, rusqlite::types::Type::Blob, e))?;

    let status_str: String = row.get(3)?;
    let status = EdgeStatus::parse(&status_str).ok_or_else(|| {
        conversion_failure(
            3,
            rusqlite::types::Type::Text,
            RelationshipError::Invalid(format!("Unknown edge status: {}", status_str)),
        )
    })?;

    Ok(RelationshipEdge {
        id,
        requester_id: user_id_at(row, 1)?,
        recipient_id: user_id_at(row, 2)?,
        status,
        created_at: row.get::<_, i64>(4)? as u64,
        updated_at: row.get::<_, i64>(5)? as u64,
    })
}
