//! Redis access token 黑名单实现
//!
//! key 形如 `auth:blacklist:<token>`，使用 `PSETEX` 写入，到期由 Redis 自动删除。

use crate::error::StorageError;
use crate::traits::RevocationStore;
use redis::AsyncCommands;

const BLACKLIST_VALUE: &str = "blacklisted";

fn blacklist_key(token: &str) -> String {
    format!("auth:blacklist:{token}")
}

/// Redis 吊销存储
pub struct RedisRevocationStore {
    client: redis::Client,
}

impl RedisRevocationStore {
    pub fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client =
            redis::Client::open(redis_url).map_err(|err| StorageError::new(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, ttl_ms: u64) -> Result<(), StorageError> {
        if ttl_ms == 0 {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_tokio_connection().await?;
        conn.pset_ex::<_, _, ()>(blacklist_key(token), BLACKLIST_VALUE, ttl_ms)
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StorageError> {
        let mut conn = self.client.get_multiplexed_tokio_connection().await?;
        let exists: bool = conn.exists(blacklist_key(token)).await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_key_prefixes_token() {
        assert_eq!(blacklist_key("abc.def"), "auth:blacklist:abc.def");
    }

    #[test]
    fn connect_rejects_invalid_url() {
        assert!(RedisRevocationStore::connect("not a url").is_err());
    }
}
