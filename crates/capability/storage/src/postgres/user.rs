//! Postgres 用户存储实现
//!
//! 角色以 `text[]` 列保存，读取时丢弃无法识别的角色名。
//! 每个修改操作只写自己负责的列，口令与停用操作在同一条语句内递增 token 版本。

use crate::error::StorageError;
use crate::models::{NewUser, UserRecord};
use crate::traits::UserStore;
use domain::{parse_roles, roles_to_strings};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const USER_COLUMNS: &str = "user_id, username, email, password_hash, token_version, roles, \
     email_verified, phone_number, phone_verified, two_factor_enabled, deactivated, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms, \
     (extract(epoch from updated_at) * 1000)::bigint as updated_at_ms";

pub struct PgUserStore {
    pub pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 把单个布尔列置为 true，返回更新后的记录。
    ///
    /// `column` 只接受本模块内的固定列名。
    async fn set_flag(&self, column: &str, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!(
            "update users set {column} = true, updated_at = now() where user_id = $1 \
             returning {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>, StorageError> {
        let sql = format!("select {USER_COLUMNS} from users where {column} = $1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StorageError> {
    let roles: Vec<String> = row.try_get("roles")?;
    Ok(UserRecord {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        token_version: row.try_get("token_version")?,
        roles: parse_roles(roles.iter().map(String::as_str)),
        email_verified: row.try_get("email_verified")?,
        phone_number: row.try_get("phone_number")?,
        phone_verified: row.try_get("phone_verified")?,
        two_factor_enabled: row.try_get("two_factor_enabled")?,
        deactivated: row.try_get("deactivated")?,
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.find_one("user_id", user_id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        self.find_one("email", email).await
    }

    async fn count_users(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("select count(*) from users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let sql = format!("select {USER_COLUMNS} from users order by created_at, username");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let sql = format!(
            "insert into users (user_id, username, email, password_hash, phone_number, roles) \
             values ($1, $2, $3, $4, $5, $6) \
             returning {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&user.user_id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone_number)
            .bind(roles_to_strings(&user.roles))
            .fetch_one(&self.pool)
            .await?;
        user_from_row(&row)
    }

    async fn set_email_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.set_flag("email_verified", user_id).await
    }

    async fn set_phone_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.set_flag("phone_verified", user_id).await
    }

    async fn enable_two_factor(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.set_flag("two_factor_enabled", user_id).await
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<i64>, StorageError> {
        let version: Option<i64> = sqlx::query_scalar(
            "update users set password_hash = $3, token_version = token_version + 1, \
             updated_at = now() where user_id = $1 and password_hash = $2 \
             returning token_version",
        )
        .bind(user_id)
        .bind(current_hash)
        .bind(new_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version)
    }

    async fn deactivate(&self, user_id: &str) -> Result<Option<i64>, StorageError> {
        let version: Option<i64> = sqlx::query_scalar(
            "update users set deactivated = true, token_version = token_version + 1, \
             updated_at = now() where user_id = $1 returning token_version",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version)
    }

    /// refresh token 通过外键级联删除。
    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("delete from users where user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i64>, StorageError> {
        let version: Option<i64> = sqlx::query_scalar(
            "update users set token_version = token_version + 1, updated_at = now() \
             where user_id = $1 returning token_version",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version)
    }
}
