//! refresh token 内存存储实现

use super::now_epoch_ms;
use crate::error::StorageError;
use crate::models::RefreshTokenRecord;
use crate::traits::RefreshTokenStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// refresh token 内存存储（token 值 → 记录）。
///
/// 轮换在同一把写锁内完成删除与写入。
pub struct InMemoryRefreshTokenStore {
    tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// 当前记录数量（含已过期但未删除的记录）。
    pub fn len(&self) -> usize {
        self.tokens.read().map(|tokens| tokens.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), StorageError> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if tokens.contains_key(&record.token) {
            return Err(StorageError::conflict("token"));
        }
        tokens.insert(record.token.clone(), record);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(tokens.get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, StorageError> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(tokens.remove(token).is_some())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, StorageError> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = tokens.len();
        tokens.retain(|_, record| record.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StorageError> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let live = tokens
            .get(old_token)
            .is_some_and(|record| !record.is_expired(now_epoch_ms()));
        if !live {
            return Ok(false);
        }
        if tokens.contains_key(&replacement.token) {
            return Err(StorageError::conflict("token"));
        }
        tokens.remove(old_token);
        tokens.insert(replacement.token.clone(), replacement);
        Ok(true)
    }
}
