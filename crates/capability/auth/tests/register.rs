mod common;

use bored_auth::{AuthError, Registration};
use bored_storage::{RefreshTokenStore, UserStore};
use common::{PASSWORD, harness, registration};
use domain::RoleTag;

#[tokio::test]
async fn first_user_is_admin_then_default_role() {
    let h = harness();
    let first = h
        .auth
        .register(registration("alice", "alice@example.com"))
        .await
        .expect("register first");
    assert!(first.user.has_role(RoleTag::Admin));
    assert!(!first.user.email_verified);
    assert_eq!(first.user.token_version, 1);

    let second = h
        .auth
        .register(registration("bob", "bob@example.com"))
        .await
        .expect("register second");
    assert!(second.user.has_role(RoleTag::BoredUser));
    assert!(!second.user.has_role(RoleTag::Admin));
}

#[tokio::test]
async fn register_issues_and_persists_refresh_token() {
    let h = harness();
    let session = h
        .auth
        .register(registration("alice", "alice@example.com"))
        .await
        .expect("register");
    let record = h
        .refresh_tokens
        .find_by_token(&session.tokens.refresh_token)
        .await
        .expect("query")
        .expect("persisted");
    assert_eq!(record.user_id, session.user.user_id);
    assert_eq!(record.expires_at_ms, session.tokens.refresh_expires_at * 1000);

    let stored = h
        .users
        .find_by_id(&session.user.user_id)
        .await
        .expect("query")
        .expect("user");
    assert_ne!(stored.password_hash, PASSWORD);
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_and_username_are_rejected() {
    let h = harness();
    h.auth
        .register(registration("alice", "alice@example.com"))
        .await
        .expect("register");

    let err = h
        .auth
        .register(registration("alice2", "alice@example.com"))
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, AuthError::DuplicateEmail));

    let err = h
        .auth
        .register(registration("alice", "other@example.com"))
        .await
        .expect_err("duplicate username");
    assert!(matches!(err, AuthError::DuplicateUsername));

    assert_eq!(h.users.count_users().await.expect("count"), 1);
    assert!(
        h.users
            .find_by_email("alice@example.com")
            .await
            .expect("query")
            .is_some()
    );
}

#[tokio::test]
async fn duplicate_phone_number_is_a_validation_error() {
    let h = harness();
    let mut first = registration("alice", "alice@example.com");
    first.phone_number = Some("+15550100".to_string());
    h.auth.register(first).await.expect("register");

    let mut second = registration("bob", "bob@example.com");
    second.phone_number = Some("+15550100".to_string());
    let err = h.auth.register(second).await.expect_err("duplicate phone");
    assert!(matches!(err, AuthError::Validation(message) if message.contains("phone")));
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let h = harness();
    let cases = [
        Registration {
            username: String::new(),
            ..registration("x", "x@example.com")
        },
        Registration {
            email: String::new(),
            ..registration("x", "x@example.com")
        },
        Registration {
            password: String::new(),
            ..registration("x", "x@example.com")
        },
        registration("x", "not-an-email"),
        Registration {
            password: "short".to_string(),
            ..registration("x", "x@example.com")
        },
    ];
    for case in cases {
        let err = h.auth.register(case).await.expect_err("invalid input");
        assert!(matches!(err, AuthError::Validation(_)), "got {err:?}");
    }
    assert_eq!(h.users.count_users().await.expect("count"), 0);
}
