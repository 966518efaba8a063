//! 用户内存存储实现
//!
//! 功能：
//! - 按 ID / 用户名 / 邮箱查找用户
//! - 创建时校验用户名、邮箱、手机号唯一
//! - 单字段更新在写锁内完成，不会覆盖并发写入的其他字段
//! - token 版本号原子递增

use super::now_epoch_ms;
use crate::error::StorageError;
use crate::models::{NewUser, UserRecord};
use crate::traits::UserStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 用户内存存储
///
/// 使用 RwLock + HashMap（user_id → UserRecord）提供线程安全的内存存储。
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    fn find_where<F>(&self, predicate: F) -> Result<Option<UserRecord>, StorageError>
    where
        F: Fn(&UserRecord) -> bool,
    {
        let users = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.values().find(|user| predicate(user)).cloned())
    }

    /// 在写锁内修改单个用户并刷新 `updated_at_ms`。
    fn modify<T, F>(&self, user_id: &str, change: F) -> Result<Option<T>, StorageError>
    where
        F: FnOnce(&mut UserRecord) -> T,
    {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.get_mut(user_id).map(|user| {
            user.updated_at_ms = now_epoch_ms();
            change(user)
        }))
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 检查是否存在冲突的唯一字段。
fn find_conflict(
    users: &HashMap<String, UserRecord>,
    username: &str,
    email: &str,
    phone_number: Option<&str>,
) -> Option<&'static str> {
    for other in users.values() {
        if other.username == username {
            return Some("username");
        }
        if other.email == email {
            return Some("email");
        }
        if phone_number.is_some() && other.phone_number.as_deref() == phone_number {
            return Some("phone_number");
        }
    }
    None
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let users = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.get(user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        self.find_where(|user| user.username == username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        self.find_where(|user| user.email == email)
    }

    async fn count_users(&self) -> Result<u64, StorageError> {
        let users = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.len() as u64)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        let users = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<UserRecord> = users.values().cloned().collect();
        items.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(items)
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if users.contains_key(&user.user_id) {
            return Err(StorageError::conflict("user_id"));
        }
        if let Some(target) = find_conflict(
            &users,
            &user.username,
            &user.email,
            user.phone_number.as_deref(),
        ) {
            return Err(StorageError::conflict(target));
        }
        let now = now_epoch_ms();
        let record = UserRecord {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            token_version: 1,
            roles: user.roles,
            email_verified: false,
            phone_number: user.phone_number,
            phone_verified: false,
            two_factor_enabled: false,
            deactivated: false,
            created_at_ms: now,
            updated_at_ms: now,
        };
        users.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    async fn set_email_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.modify(user_id, |user| {
            user.email_verified = true;
            user.clone()
        })
    }

    async fn set_phone_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.modify(user_id, |user| {
            user.phone_verified = true;
            user.clone()
        })
    }

    async fn enable_two_factor(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        self.modify(user_id, |user| {
            user.two_factor_enabled = true;
            user.clone()
        })
    }

    async fn update_password_hash(
        &self,
        user_id: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<i64>, StorageError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(user) = users
            .get_mut(user_id)
            .filter(|user| user.password_hash == current_hash)
        else {
            return Ok(None);
        };
        user.password_hash = new_hash.to_string();
        user.token_version += 1;
        user.updated_at_ms = now_epoch_ms();
        Ok(Some(user.token_version))
    }

    async fn deactivate(&self, user_id: &str) -> Result<Option<i64>, StorageError> {
        self.modify(user_id, |user| {
            user.deactivated = true;
            user.token_version += 1;
            user.token_version
        })
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.remove(user_id).is_some())
    }

    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i64>, StorageError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(users.get_mut(user_id).map(|user| {
            user.token_version += 1;
            user.updated_at_ms = now_epoch_ms();
            user.token_version
        }))
    }
}
