//! access token 黑名单内存实现
//!
//! 惰性过期：查询时比较到期时间，不做后台清理；写入时顺带清掉已过期条目。

use super::now_epoch_ms;
use crate::error::StorageError;
use crate::traits::RevocationStore;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, i64>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 条目到期时间（毫秒时间戳），用于校验 TTL 上限。
    pub fn expires_at_ms(&self, token: &str) -> Option<i64> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(token).copied())
    }
}

impl Default for InMemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token: &str, ttl_ms: u64) -> Result<(), StorageError> {
        if ttl_ms == 0 {
            return Ok(());
        }
        let now = now_epoch_ms();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(token.to_string(), now.saturating_add(ttl_ms as i64));
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(entries
            .get(token)
            .is_some_and(|expires_at| *expires_at > now_epoch_ms()))
    }
}
