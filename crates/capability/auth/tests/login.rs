mod common;

use bored_auth::{AuthError, Credentials};
use common::{ACCESS_SECRET, PASSWORD, PHONE_CODE, TWO_FACTOR_CODE, harness, verified_user};

fn by_username(username: &str, password: &str) -> Credentials {
    Credentials {
        username: Some(username.to_string()),
        password: password.to_string(),
        ..Credentials::default()
    }
}

fn by_email(email: &str, password: &str) -> Credentials {
    Credentials {
        email: Some(email.to_string()),
        password: password.to_string(),
        ..Credentials::default()
    }
}

#[tokio::test]
async fn login_by_username_and_by_email() {
    let h = harness();
    let registered = verified_user(&h.auth, "alice", "alice@example.com").await;

    let session = h
        .auth
        .login(by_username("alice", PASSWORD))
        .await
        .expect("login by username");
    assert_eq!(session.user.user_id, registered.user.user_id);
    let claims = bored_auth::verify_access_token(&session.tokens.access_token, ACCESS_SECRET.as_bytes())
        .expect("access claims");
    assert_eq!(claims.sub, registered.user.user_id);
    assert!((claims.exp - claims.iat - 900).abs() <= 1);

    let session = h
        .auth
        .login(by_email("alice@example.com", PASSWORD))
        .await
        .expect("login by email");
    assert_eq!(session.user.username, "alice");
    assert!(
        h.refresh_tokens.len() >= 3,
        "register and both logins persist refresh tokens"
    );
}

#[tokio::test]
async fn unknown_user_and_wrong_password_look_identical() {
    let h = harness();
    verified_user(&h.auth, "alice", "alice@example.com").await;

    let wrong_password = h
        .auth
        .login(by_username("alice", "not the password"))
        .await
        .expect_err("wrong password");
    let unknown = h
        .auth
        .login(by_username("mallory", PASSWORD))
        .await
        .expect_err("unknown user");
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown.to_string());
}

#[tokio::test]
async fn missing_identifier_is_rejected() {
    let h = harness();
    let err = h
        .auth
        .login(Credentials {
            username: Some("  ".to_string()),
            password: PASSWORD.to_string(),
            ..Credentials::default()
        })
        .await
        .expect_err("no identifier");
    assert!(matches!(err, AuthError::MissingIdentifier));
}

#[tokio::test]
async fn unverified_email_fails_after_correct_password() {
    let h = harness();
    h.auth
        .register(common::registration("bob", "bob@example.com"))
        .await
        .expect("register");

    let err = h
        .auth
        .login(by_username("bob", PASSWORD))
        .await
        .expect_err("unverified");
    assert!(matches!(err, AuthError::EmailNotVerified));

    let err = h
        .auth
        .login(by_username("bob", "not the password"))
        .await
        .expect_err("wrong password");
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn two_factor_code_is_required_once_enabled() {
    let h = harness();
    let mut registration = common::registration("carol", "carol@example.com");
    registration.phone_number = Some("+15550100".to_string());
    let session = h.auth.register(registration).await.expect("register");
    let user_id = session.user.user_id;
    h.auth.verify_email(&user_id).await.expect("verify email");
    h.auth
        .verify_phone_number(&user_id, PHONE_CODE)
        .await
        .expect("verify phone");
    h.auth.enable_two_factor(&user_id).await.expect("enable 2fa");

    let err = h
        .auth
        .login(by_username("carol", PASSWORD))
        .await
        .expect_err("missing code");
    assert!(matches!(err, AuthError::InvalidTwoFactorCode));

    let mut credentials = by_username("carol", PASSWORD);
    credentials.two_fa_code = Some("000000".to_string());
    let err = h.auth.login(credentials).await.expect_err("wrong code");
    assert!(matches!(err, AuthError::InvalidTwoFactorCode));

    let mut credentials = by_username("carol", PASSWORD);
    credentials.two_fa_code = Some(TWO_FACTOR_CODE.to_string());
    h.auth.login(credentials).await.expect("login with code");
}

#[tokio::test]
async fn deactivated_account_cannot_log_in() {
    let h = harness();
    let session = verified_user(&h.auth, "dave", "dave@example.com").await;
    h.auth
        .deactivate_account(&session.user.user_id, None)
        .await
        .expect("deactivate");

    let err = h
        .auth
        .login(by_username("dave", PASSWORD))
        .await
        .expect_err("deactivated");
    assert!(matches!(err, AuthError::InvalidCredentials));
}
