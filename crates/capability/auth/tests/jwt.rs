use std::collections::BTreeSet;
use std::time::Duration;

use bored_auth::{
    TokenCodec, TokenError, issue_access_token, issue_refresh_token, verify_access_token,
    verify_refresh_token,
};
use domain::RoleTag;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

const SECRET: &[u8] = b"secret";

fn roles() -> BTreeSet<RoleTag> {
    BTreeSet::from([RoleTag::Admin, RoleTag::Editor])
}

#[test]
fn access_token_round_trip() {
    let token = issue_access_token("user-1", &roles(), 3, SECRET, Duration::from_secs(900))
        .expect("issue");
    let claims = verify_access_token(&token, SECRET).expect("verify");
    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.roles, roles());
    assert_eq!(claims.ver, 3);
    assert_eq!(claims.typ, "access");
    assert_eq!(claims.exp - claims.iat, 900);
}

#[test]
fn refresh_token_has_its_own_type() {
    let token = issue_refresh_token("user-1", 1, SECRET, Duration::from_secs(60)).expect("issue");
    let claims = verify_refresh_token(&token, SECRET).expect("verify");
    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.typ, "refresh");

    let access = issue_access_token("user-1", &roles(), 1, SECRET, Duration::from_secs(60))
        .expect("issue");
    assert_eq!(
        verify_refresh_token(&access, SECRET),
        Err(TokenError::Malformed)
    );
    assert_eq!(
        verify_access_token(&token, SECRET),
        Err(TokenError::Malformed)
    );
}

#[test]
fn wrong_secret_is_invalid_signature() {
    let token = issue_access_token("user-1", &roles(), 1, SECRET, Duration::from_secs(60))
        .expect("issue");
    assert_eq!(
        verify_access_token(&token, b"other"),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn tampered_payload_is_invalid_signature() {
    let first = issue_access_token("user-1", &roles(), 1, SECRET, Duration::from_secs(60))
        .expect("issue");
    let second = issue_access_token("user-2", &roles(), 1, SECRET, Duration::from_secs(60))
        .expect("issue");
    let first: Vec<&str> = first.split('.').collect();
    let second: Vec<&str> = second.split('.').collect();
    let forged = format!("{}.{}.{}", first[0], second[1], first[2]);
    assert_eq!(
        verify_access_token(&forged, SECRET),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn other_algorithms_are_rejected() {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64;
    let claims = serde_json::json!({
        "sub": "user-1",
        "roles": ["admin"],
        "ver": 1,
        "iat": now,
        "exp": now + 60,
        "jti": "jti-1",
        "typ": "access",
    });
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS384),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .expect("encode");
    assert_eq!(
        verify_access_token(&token, SECRET),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn zero_ttl_is_expired() {
    let token = issue_access_token("user-1", &roles(), 1, SECRET, Duration::ZERO).expect("issue");
    assert_eq!(
        verify_access_token(&token, SECRET),
        Err(TokenError::Expired)
    );
}

#[test]
fn empty_secret_is_rejected() {
    assert_eq!(
        issue_access_token("user-1", &roles(), 1, b"", Duration::from_secs(60)),
        Err(TokenError::EmptySecret)
    );
    assert_eq!(
        verify_access_token("a.b.c", b""),
        Err(TokenError::EmptySecret)
    );
}

#[test]
fn garbage_is_malformed() {
    assert_eq!(
        verify_access_token("not-a-token", SECRET),
        Err(TokenError::Malformed)
    );
}

#[test]
fn tokens_issued_together_are_distinct() {
    let codec = TokenCodec::from_minutes_and_days("a", "r", 15, 7);
    let first = codec.issue_pair("user-1", &roles(), 1).expect("issue");
    let second = codec.issue_pair("user-1", &roles(), 1).expect("issue");
    assert_ne!(first.access_token, second.access_token);
    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(first.refresh_expires_at - first.access_expires_at, 7 * 86_400 - 900);

    let refresh = codec.verify_refresh(&first.refresh_token).expect("refresh");
    assert_eq!(refresh.ver, 1);
    assert!(matches!(
        codec.verify_access(&first.refresh_token),
        Err(TokenError::InvalidSignature)
    ));
}
