//! PostgreSQL store.
//!
//! Counter mutations are single `UPDATE ... WHERE <predicate> RETURNING`
//! statements. Under READ COMMITTED a concurrent writer blocks on the row lock
//! and re-evaluates the predicate against the committed row, so the
//! membership arrays and their counters never diverge.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PurgeReport, Store};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        like::ItemKind,
        thread::{NewThread, THREAD_TTL_HOURS, Thread},
    },
};

const THREAD_COLUMNS: &str = "id, text, owner_id, message_count, like_count, liked_by, \
     clicks, clicked_by, files, created_at, expires_at";

const COMMENT_COLUMNS: &str = "id, thread_id, message_number, text, reply_to, is_op, \
     like_count, liked_by, reply_count, files, created_at, thread_expires_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Table name and expiry column per item kind. Both are static identifiers.
fn table_of(kind: ItemKind) -> (&'static str, &'static str) {
    match kind {
        ItemKind::Thread => ("threads", "expires_at"),
        ItemKind::Comment => ("comments", "thread_expires_at"),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_thread(&self, new: NewThread) -> Result<Thread, AppError> {
        let sql = format!(
            r#"
            INSERT INTO threads (id, text, owner_id, created_at, expires_at)
            VALUES ($1, $2, $3, NOW(), NOW() + make_interval(hours => $4))
            RETURNING {THREAD_COLUMNS}
            "#
        );
        let thread = sqlx::query_as::<_, Thread>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.text)
            .bind(&new.owner_id)
            .bind(THREAD_TTL_HOURS as i32)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create thread: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;
        Ok(thread)
    }

    async fn find_thread(&self, id: Uuid) -> Result<Option<Thread>, AppError> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = $1 AND expires_at > NOW()");
        Ok(sqlx::query_as::<_, Thread>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1 AND thread_expires_at > NOW()"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn append_files(&self, kind: ItemKind, id: Uuid, urls: &[String]) -> Result<bool, AppError> {
        let (table, expiry) = table_of(kind);
        let sql = format!(
            "UPDATE {table} SET files = array_cat(files, $2) WHERE id = $1 AND {expiry} > NOW()"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(urls)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn add_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        let (table, expiry) = table_of(kind);
        let sql = format!(
            r#"
            UPDATE {table}
            SET liked_by = array_append(liked_by, $2), like_count = like_count + 1
            WHERE id = $1 AND {expiry} > NOW() AND NOT ($2 = ANY(liked_by))
            RETURNING like_count
            "#
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn remove_like(&self, kind: ItemKind, id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        let (table, expiry) = table_of(kind);
        let sql = format!(
            r#"
            UPDATE {table}
            SET liked_by = array_remove(liked_by, $2), like_count = like_count - 1
            WHERE id = $1 AND {expiry} > NOW() AND $2 = ANY(liked_by)
            RETURNING like_count
            "#
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add_click(&self, thread_id: Uuid, token: &str) -> Result<Option<i64>, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE threads
            SET clicked_by = array_append(clicked_by, $2), clicks = clicks + 1
            WHERE id = $1 AND expires_at > NOW() AND NOT ($2 = ANY(clicked_by))
            RETURNING clicks
            "#,
        )
        .bind(thread_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn increment_message_count(&self, thread_id: Uuid) -> Result<Option<i64>, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE threads
            SET message_count = message_count + 1
            WHERE id = $1 AND expires_at > NOW()
            RETURNING message_count
            "#,
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment, AppError> {
        let sql = format!(
            r#"
            INSERT INTO comments (id, thread_id, message_number, text, reply_to, is_op, created_at, thread_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7)
            RETURNING {COMMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.thread_id)
            .bind(new.message_number)
            .bind(&new.text)
            .bind(new.reply_to)
            .bind(new.is_op)
            .bind(new.thread_expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
                    "Message number {} already exists in thread",
                    new.message_number
                )),
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::thread_not_found(),
                _ => {
                    tracing::error!("Failed to create comment: {:?}", e);
                    AppError::InternalServerError(e.to_string())
                }
            })
    }

    async fn comment_number_exists(&self, thread_id: Uuid, message_number: i64) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM comments
                WHERE thread_id = $1 AND message_number = $2 AND thread_expires_at > NOW()
            )
            "#,
        )
        .bind(thread_id)
        .bind(message_number)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn increment_reply_count(&self, thread_id: Uuid, message_number: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE comments SET reply_count = reply_count + 1
            WHERE thread_id = $1 AND message_number = $2 AND thread_expires_at > NOW()
            "#,
        )
        .bind(thread_id)
        .bind(message_number)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn live_threads(&self) -> Result<Vec<Thread>, AppError> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE expires_at > NOW()");
        Ok(sqlx::query_as::<_, Thread>(&sql).fetch_all(&self.pool).await?)
    }

    async fn live_comments(&self, thread_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE thread_id = $1 AND thread_expires_at > NOW()"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn threads_liked_by(&self, token: &str) -> Result<Vec<Thread>, AppError> {
        let sql = format!(
            r#"
            SELECT {THREAD_COLUMNS} FROM threads
            WHERE $1 = ANY(liked_by) AND expires_at > NOW()
            ORDER BY created_at DESC, id DESC
            "#
        );
        Ok(sqlx::query_as::<_, Thread>(&sql)
            .bind(token)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn purge_expired(&self) -> Result<PurgeReport, AppError> {
        let comments = sqlx::query("DELETE FROM comments WHERE thread_expires_at <= NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let threads = sqlx::query("DELETE FROM threads WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(PurgeReport { threads, comments })
    }
}
