//! Chat Thread Repository
//!
//! One thread per user, enforced by a unique index on `user` (see
//! `DbService::bootstrap`). `get_or_create` tolerates a concurrent
//! create racing on that index by re-reading.

use serde::Deserialize;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::chat::ThreadStatus;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ChatThread, ThreadStatusCount};

pub const CHAT_THREAD_TABLE: &str = "chat_thread";

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct UnreadTotalRow {
    total: i64,
}

#[derive(Clone)]
pub struct ChatThreadRepository {
    base: BaseRepository,
}

impl ChatThreadRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<ChatThread>> {
        let thread: Option<ChatThread> = self.base.db().select(id.clone()).await?;
        Ok(thread)
    }

    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Option<ChatThread>> {
        let threads: Vec<ChatThread> = self
            .base
            .db()
            .query("SELECT * FROM chat_thread WHERE user = $user")
            .bind(("user", user.to_string()))
            .await?
            .take(0)?;
        Ok(threads.into_iter().next())
    }

    /// Return the user's single thread, creating it lazily. Idempotent.
    pub async fn get_or_create(&self, user: &RecordId) -> RepoResult<ChatThread> {
        if let Some(existing) = self.find_by_user(user).await? {
            return Ok(existing);
        }

        let created: Result<Option<ChatThread>, surrealdb::Error> = self
            .base
            .db()
            .create(CHAT_THREAD_TABLE)
            .content(ChatThread::new(user.clone()))
            .await;

        match created {
            Ok(Some(thread)) => Ok(thread),
            Ok(None) => Err(RepoError::Database("Failed to create chat thread".into())),
            // Lost the unique-index race to a concurrent create
            Err(err) => match self.find_by_user(user).await? {
                Some(existing) => Ok(existing),
                None => Err(err.into()),
            },
        }
    }

    /// Write back a mutated thread document.
    pub async fn save(&self, thread: &ChatThread) -> RepoResult<ChatThread> {
        let id = thread
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("thread has no id".into()))?;
        let updated: Option<ChatThread> = self
            .base
            .db()
            .update(id.clone())
            .content(thread.clone())
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Chat thread {id} not found")))
    }

    /// Admin console listing, most recently active first.
    pub async fn list(
        &self,
        status: Option<ThreadStatus>,
        limit: i64,
        start: i64,
    ) -> RepoResult<Vec<ChatThread>> {
        let threads: Vec<ChatThread> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query("SELECT * FROM chat_thread WHERE status = $status ORDER BY last_activity DESC LIMIT $limit START $start")
                    .bind(("status", status))
                    .bind(("limit", limit))
                    .bind(("start", start))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM chat_thread ORDER BY last_activity DESC LIMIT $limit START $start")
                    .bind(("limit", limit))
                    .bind(("start", start))
                    .await?
                    .take(0)?
            }
        };
        Ok(threads)
    }

    pub async fn count(&self, status: Option<ThreadStatus>) -> RepoResult<i64> {
        let rows: Vec<CountRow> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query("SELECT count() AS count FROM chat_thread WHERE status = $status GROUP ALL")
                    .bind(("status", status))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT count() AS count FROM chat_thread GROUP ALL")
                    .await?
                    .take(0)?
            }
        };
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    /// Thread counts per status, for the console header.
    pub async fn counts_by_status(&self) -> RepoResult<Vec<ThreadStatusCount>> {
        let rows: Vec<ThreadStatusCount> = self
            .base
            .db()
            .query("SELECT status, count() AS count FROM chat_thread GROUP BY status")
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// Total unread-to-admin across all threads.
    pub async fn total_unread_admin(&self) -> RepoResult<i64> {
        let rows: Vec<UnreadTotalRow> = self
            .base
            .db()
            .query("SELECT math::sum(unread.admin) AS total FROM chat_thread GROUP ALL")
            .await?
            .take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    /// Hard delete, returning the removed thread.
    pub async fn delete(&self, id: &RecordId) -> RepoResult<ChatThread> {
        let deleted: Option<ChatThread> = self.base.db().delete(id.clone()).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Chat thread {id} not found")))
    }
}
