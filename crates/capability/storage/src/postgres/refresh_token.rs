//! Postgres refresh token 存储实现

use crate::error::StorageError;
use crate::models::RefreshTokenRecord;
use crate::traits::RefreshTokenStore;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgRefreshTokenStore {
    pub pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<RefreshTokenRecord, StorageError> {
    Ok(RefreshTokenRecord {
        token_id: row.try_get("token_id")?,
        user_id: row.try_get("user_id")?,
        token: row.try_get("token")?,
        expires_at_ms: row.try_get("expires_at_ms")?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into refresh_tokens (token_id, user_id, token, expires_at, created_at, updated_at) \
             values ($1, $2, $3, to_timestamp($4 / 1000.0), to_timestamp($5 / 1000.0), \
             to_timestamp($6 / 1000.0))",
        )
        .bind(&record.token_id)
        .bind(&record.user_id)
        .bind(&record.token)
        .bind(record.expires_at_ms as f64)
        .bind(record.created_at_ms as f64)
        .bind(record.updated_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let row = sqlx::query(
            "select token_id, user_id, token, \
             (extract(epoch from expires_at) * 1000)::bigint as expires_at_ms, \
             (extract(epoch from created_at) * 1000)::bigint as created_at_ms, \
             (extract(epoch from updated_at) * 1000)::bigint as updated_at_ms \
             from refresh_tokens where token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from refresh_tokens where token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, StorageError> {
        let result = sqlx::query("delete from refresh_tokens where user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StorageError> {
        // 行锁保证并发轮换同一旧 token 时只有一个事务删到记录。
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query(
            "delete from refresh_tokens where token = $1 and expires_at > now()",
        )
        .bind(old_token)
        .execute(&mut *tx)
        .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        sqlx::query(
            "insert into refresh_tokens (token_id, user_id, token, expires_at, created_at, updated_at) \
             values ($1, $2, $3, to_timestamp($4 / 1000.0), to_timestamp($5 / 1000.0), \
             to_timestamp($6 / 1000.0))",
        )
        .bind(&replacement.token_id)
        .bind(&replacement.user_id)
        .bind(&replacement.token)
        .bind(replacement.expires_at_ms as f64)
        .bind(replacement.created_at_ms as f64)
        .bind(replacement.updated_at_ms as f64)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}
