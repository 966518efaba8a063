use bored_storage::{InMemoryRefreshTokenStore, RefreshTokenRecord, RefreshTokenStore};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_millis() as i64
}

fn record(token: &str, user_id: &str, expires_at_ms: i64) -> RefreshTokenRecord {
    let now = now_ms();
    RefreshTokenRecord {
        token_id: format!("id-{token}"),
        user_id: user_id.to_string(),
        token: token.to_string(),
        expires_at_ms,
        created_at_ms: now,
        updated_at_ms: now,
    }
}

#[tokio::test]
async fn rotate_replaces_live_token() {
    let store = InMemoryRefreshTokenStore::new();
    let later = now_ms() + 60_000;
    store.create(record("old", "u1", later)).await.expect("create");

    let rotated = store
        .rotate("old", record("new", "u1", later))
        .await
        .expect("rotate");
    assert!(rotated);
    assert!(store.find_by_token("old").await.expect("find").is_none());
    assert!(store.find_by_token("new").await.expect("find").is_some());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn rotate_rejects_missing_or_expired() {
    let store = InMemoryRefreshTokenStore::new();
    let later = now_ms() + 60_000;
    assert!(
        !store
            .rotate("missing", record("new", "u1", later))
            .await
            .expect("rotate")
    );

    store
        .create(record("stale", "u1", now_ms() - 1))
        .await
        .expect("create");
    assert!(
        !store
            .rotate("stale", record("new", "u1", later))
            .await
            .expect("rotate")
    );
    assert!(store.find_by_token("new").await.expect("find").is_none());
}

#[tokio::test]
async fn concurrent_rotation_has_single_winner() {
    let store = Arc::new(InMemoryRefreshTokenStore::new());
    let later = now_ms() + 60_000;
    store.create(record("old", "u1", later)).await.expect("create");

    let a = {
        let store = store.clone();
        tokio::spawn(async move { store.rotate("old", record("new-a", "u1", later)).await })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move { store.rotate("old", record("new-b", "u1", later)).await })
    };
    let a = a.await.expect("join").expect("rotate");
    let b = b.await.expect("join").expect("rotate");
    assert!(a ^ b);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn delete_all_for_user_only_touches_owner() {
    let store = InMemoryRefreshTokenStore::new();
    let later = now_ms() + 60_000;
    store.create(record("a1", "alice", later)).await.expect("create");
    store.create(record("a2", "alice", later)).await.expect("create");
    store.create(record("b1", "bob", later)).await.expect("create");

    assert_eq!(store.delete_all_for_user("alice").await.expect("delete"), 2);
    assert!(store.find_by_token("b1").await.expect("find").is_some());
    assert!(!store.delete_by_token("a1").await.expect("delete"));
    assert!(store.delete_by_token("b1").await.expect("delete"));
    assert!(store.is_empty());
}
