mod common;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bored_auth::AuthError;
use bored_storage::{
    InMemoryRefreshTokenStore, InMemoryUserStore, RefreshTokenRecord, RefreshTokenStore,
    StorageError,
};
use common::{harness, service_with_stores, verified_user};
use tokio::sync::Barrier;

#[tokio::test]
async fn refresh_token_is_single_use_after_rotation() {
    let h = harness();
    let session = verified_user(&h.auth, "alice", "alice@example.com").await;

    let rotated = h
        .auth
        .rotate_refresh_token(&session.tokens.refresh_token)
        .await
        .expect("rotate");
    assert_ne!(session.tokens.refresh_token, rotated.refresh_token);

    let result = h
        .auth
        .rotate_refresh_token(&session.tokens.refresh_token)
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));

    h.auth
        .rotate_refresh_token(&rotated.refresh_token)
        .await
        .expect("rotate new token");
}

/// 查到记录后先让出 50ms 再返回，使并发调用都能通过查询，由 `rotate` 决定胜者。
struct LingeringRefreshTokens {
    inner: Arc<InMemoryRefreshTokenStore>,
}

#[async_trait]
impl RefreshTokenStore for LingeringRefreshTokens {
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), StorageError> {
        self.inner.create(record).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StorageError> {
        let found = self.inner.find_by_token(token).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        found
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, StorageError> {
        self.inner.delete_by_token(token).await
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, StorageError> {
        self.inner.delete_all_for_user(user_id).await
    }

    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StorageError> {
        self.inner.rotate(old_token, replacement).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_rotation_has_exactly_one_winner() {
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
    let auth = Arc::new(service_with_stores(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(LingeringRefreshTokens {
            inner: refresh_tokens.clone(),
        }),
    ));
    let session = verified_user(&auth, "alice", "alice@example.com").await;
    let barrier = Arc::new(Barrier::new(2));

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let auth = auth.clone();
            let barrier = barrier.clone();
            let token = session.tokens.refresh_token.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                auth.rotate_refresh_token(&token).await
            })
        })
        .collect();
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.expect("join"));
    }

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|result| matches!(result, Err(AuthError::InvalidOrExpiredToken)))
    );
    // 失败的一方没有写入替换记录
    assert_eq!(refresh_tokens.len(), 1);
}

#[tokio::test]
async fn unknown_and_expired_tokens_are_rejected() {
    let h = harness();
    let session = verified_user(&h.auth, "alice", "alice@example.com").await;

    let result = h.auth.rotate_refresh_token("never-issued").await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_millis() as i64;
    h.refresh_tokens
        .create(RefreshTokenRecord {
            token_id: "stale".to_string(),
            user_id: session.user.user_id.clone(),
            token: "stale-token".to_string(),
            expires_at_ms: now_ms - 1_000,
            created_at_ms: now_ms - 10_000,
            updated_at_ms: now_ms - 10_000,
        })
        .await
        .expect("seed");
    let result = h.auth.rotate_refresh_token("stale-token").await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn logout_all_invalidates_refresh_tokens() {
    let h = harness();
    let session = verified_user(&h.auth, "alice", "alice@example.com").await;

    h.auth
        .logout_all(&session.user.user_id, None)
        .await
        .expect("logout all");
    assert!(h.refresh_tokens.is_empty());
    let result = h
        .auth
        .rotate_refresh_token(&session.tokens.refresh_token)
        .await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}

#[tokio::test]
async fn stale_version_in_refresh_token_is_rejected() {
    let h = harness();
    let session = verified_user(&h.auth, "alice", "alice@example.com").await;
    let issued_before = session.tokens.refresh_token.clone();

    // 版本递增后重新写回旧 token 记录，只有版本号能拦住它。
    let record = h
        .refresh_tokens
        .find_by_token(&issued_before)
        .await
        .expect("query")
        .expect("record");
    h.auth
        .logout_all(&session.user.user_id, None)
        .await
        .expect("logout all");
    h.refresh_tokens.create(record).await.expect("reinsert");

    let result = h.auth.rotate_refresh_token(&issued_before).await;
    assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
}
