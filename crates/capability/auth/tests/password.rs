use bored_auth::{
    AuthError, hash_password, spawn_hash_password, spawn_verify_password, verify_password,
};

#[test]
fn argon2_hash_verifies() {
    let hash = hash_password("admin123").expect("hash");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "admin123").expect("check"));
}

#[test]
fn wrong_password_rejected() {
    let hash = hash_password("admin123").expect("hash");
    assert!(!verify_password(&hash, "bad").expect("check"));
}

#[test]
fn hashes_are_salted() {
    let first = hash_password("admin123").expect("hash");
    let second = hash_password("admin123").expect("hash");
    assert_ne!(first, second);
}

#[test]
fn plaintext_storage_is_not_accepted() {
    let result = verify_password("admin123", "admin123");
    assert!(matches!(result, Err(AuthError::Internal(_))));
}

#[tokio::test]
async fn blocking_pool_variants_agree() {
    let hash = spawn_hash_password("admin123".to_string())
        .await
        .expect("hash");
    assert!(
        spawn_verify_password(hash.clone(), "admin123".to_string())
            .await
            .expect("check")
    );
    assert!(
        !spawn_verify_password(hash, "bad".to_string())
            .await
            .expect("check")
    );
}

#[tokio::test]
async fn hashing_yields_to_the_runtime() {
    // 单线程运行时上，只有哈希离开 worker 线程，计时器才能先于哈希完成触发
    let result = tokio::time::timeout(
        std::time::Duration::from_millis(1),
        spawn_hash_password("admin123".to_string()),
    )
    .await;
    assert!(result.is_err());
}
