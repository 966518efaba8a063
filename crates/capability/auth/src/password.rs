use crate::AuthError;
use argon2::{
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    password_hash::SaltString,
};
use rand_core::OsRng;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(err.to_string()))?;
    Ok(hash.to_string())
}

/// 校验口令；存储值不是合法的 PHC 哈希串时视为内部错误。
pub fn verify_password(stored_password_hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_password_hash)
        .map_err(|err| AuthError::Internal(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 在阻塞线程池中计算哈希，避免占用异步 worker；调用方的超时可以及时生效。
pub async fn spawn_hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))?
}

/// 在阻塞线程池中校验口令。
pub async fn spawn_verify_password(
    stored_password_hash: String,
    password: String,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&stored_password_hash, &password))
        .await
        .map_err(|err| AuthError::Internal(err.to_string()))?
}
