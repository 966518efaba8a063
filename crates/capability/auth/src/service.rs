//! 认证核心操作。

use crate::jwt::{IssuedTokens, TokenError};
use crate::password::{spawn_hash_password, spawn_verify_password};
use crate::validate::{check_password, is_valid_email, required};
use crate::{AuthError, AuthService, AuthSession, Credentials, Registration, now_epoch_ms};
use bored_storage::{NewUser, RefreshTokenRecord, StorageError, UserRecord};
use domain::{RoleTag, default_roles};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

impl AuthService {
    /// 注册新用户并签发 token 对；邮箱验证不阻塞签发。
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        self.bounded("register", self.register_inner(registration))
            .await
    }

    /// 登录：先按用户名、再按邮箱解析用户。
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        self.bounded("login", self.login_inner(credentials)).await
    }

    /// 用 refresh token 换取新 token 对，旧 token 作废。
    pub async fn rotate_refresh_token(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        self.bounded("rotate_refresh_token", self.rotate_inner(refresh_token))
            .await
    }

    /// 删除 refresh token；记录不存在也视为成功。
    ///
    /// 携带的 access token 有效时一并拉黑。
    pub async fn logout(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.bounded("logout", async {
            let removed = self.refresh_tokens.delete_by_token(refresh_token).await?;
            tracing::info!(removed, "refresh token logged out");
            if let Some(access_token) = access_token {
                // refresh token 已删除，黑名单写入失败不影响登出结果
                if let Err(err) = self.revoke_presented(access_token).await {
                    tracing::warn!(error = %err, "logout blacklist failed");
                }
            }
            Ok(())
        })
        .await
    }

    /// 将 access token 写入黑名单，TTL 不超过 token 自身的剩余有效期。
    pub async fn blacklist_access_token(
        &self,
        access_token: &str,
        remaining_ttl: Duration,
    ) -> Result<(), AuthError> {
        self.bounded("blacklist_access_token", async {
            let claims = match self.codec.verify_access(access_token) {
                Ok(claims) => claims,
                Err(TokenError::Expired) => return Ok(()),
                Err(TokenError::EmptySecret | TokenError::Signing(_)) => {
                    return Err(AuthError::Internal("token codec misconfigured".to_string()));
                }
                Err(_) => return Err(AuthError::Unauthenticated),
            };
            let requested_ms = remaining_ttl.as_millis().min(u64::MAX as u128) as u64;
            let ttl_ms = requested_ms.min(remaining_lifetime_ms(claims.exp));
            self.revocations.revoke(access_token, ttl_ms).await?;
            tracing::info!(user_id = %claims.sub, ttl_ms, "access token blacklisted");
            Ok(())
        })
        .await
    }

    pub async fn verify_email(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.bounded("verify_email", async {
            let user = self
                .users
                .set_email_verified(user_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            tracing::info!(user_id, "email verified");
            Ok(user)
        })
        .await
    }

    pub async fn verify_phone_number(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<UserRecord, AuthError> {
        self.bounded("verify_phone_number", async {
            let user = self.require_user(user_id).await?;
            if user.phone_number.is_none() {
                return Err(AuthError::Validation(
                    "no phone number on file".to_string(),
                ));
            }
            if !self.phone_codes.is_valid(&user, code) {
                tracing::warn!(user_id, "phone verification code rejected");
                return Err(AuthError::InvalidCode);
            }
            let user = self
                .users
                .set_phone_verified(user_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            tracing::info!(user_id, "phone number verified");
            Ok(user)
        })
        .await
    }

    pub async fn enable_two_factor(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.bounded("enable_two_factor", async {
            let user = self.require_user(user_id).await?;
            if !user.phone_verified {
                return Err(AuthError::Validation(
                    "phone number must be verified before enabling 2FA".to_string(),
                ));
            }
            let user = self
                .users
                .enable_two_factor(user_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            tracing::info!(user_id, "two-factor authentication enabled");
            Ok(user)
        })
        .await
    }

    /// 修改口令，并使此前签发的全部 token 失效。
    ///
    /// 新哈希只在存储中的哈希仍是校验时读到的那个时写入，并发修改中只有一个成功。
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.bounded("change_password", async {
            let user = self.require_user(user_id).await?;
            let matches =
                spawn_verify_password(user.password_hash.clone(), current_password.to_string())
                    .await?;
            if !matches {
                tracing::warn!(user_id, "password change rejected");
                return Err(AuthError::InvalidCredentials);
            }
            check_password(new_password)?;
            let new_hash = spawn_hash_password(new_password.to_string()).await?;
            let Some(version) = self
                .users
                .update_password_hash(user_id, &user.password_hash, &new_hash)
                .await?
            else {
                tracing::warn!(user_id, "password changed concurrently");
                return Err(AuthError::InvalidCredentials);
            };
            let removed = self.refresh_tokens.delete_all_for_user(user_id).await?;
            tracing::info!(user_id, token_version = version, removed, "password changed");
            Ok(())
        })
        .await
    }

    /// 注销全部会话。
    pub async fn logout_all(
        &self,
        user_id: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.bounded("logout_all", async {
            self.invalidate_sessions(user_id).await?;
            if let Some(access_token) = access_token {
                self.revoke_presented(access_token).await?;
            }
            tracing::info!(user_id, "all sessions logged out");
            Ok(())
        })
        .await
    }

    /// 停用账号：置停用标记并注销全部会话。
    pub async fn deactivate_account(
        &self,
        user_id: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.bounded("deactivate_account", async {
            let version = self
                .users
                .deactivate(user_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            let removed = self.refresh_tokens.delete_all_for_user(user_id).await?;
            tracing::info!(user_id, token_version = version, removed, "sessions invalidated");
            if let Some(access_token) = access_token {
                self.revoke_presented(access_token).await?;
            }
            tracing::info!(user_id, "account deactivated");
            Ok(())
        })
        .await
    }

    /// 删除用户及其全部 refresh token；已签发的 access token 由鉴权网关按用户不存在拒绝。
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        self.bounded("delete_user", async {
            if !self.users.delete_user(user_id).await? {
                return Err(AuthError::NotFound);
            }
            let removed = self.refresh_tokens.delete_all_for_user(user_id).await?;
            tracing::info!(user_id, removed, "user deleted");
            Ok(())
        })
        .await
    }

    pub async fn current_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.bounded("current_user", self.require_user(user_id))
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AuthError> {
        self.bounded("list_users", async { Ok(self.users.list_users().await?) })
            .await
    }

    async fn register_inner(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let username = required("username", &registration.username)?;
        let email = required("email", &registration.email)?;
        if registration.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(AuthError::Validation("invalid email address".to_string()));
        }
        check_password(&registration.password)?;
        let phone_number = registration
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let roles = if self.users.count_users().await? == 0 {
            BTreeSet::from([RoleTag::Admin])
        } else {
            default_roles()
        };
        let password_hash = spawn_hash_password(registration.password.clone()).await?;
        let user = self
            .users
            .create_user(NewUser {
                user_id: Uuid::new_v4().to_string(),
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                phone_number,
                roles,
            })
            .await
            .map_err(conflict_error)?;

        let tokens = self.issue_session(&user).await?;
        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(AuthSession { tokens, user })
    }

    async fn login_inner(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        let username = non_empty(credentials.username.as_deref());
        let email = non_empty(credentials.email.as_deref());
        if username.is_none() && email.is_none() {
            return Err(AuthError::MissingIdentifier);
        }

        let mut user = None;
        if let Some(username) = username {
            user = self.users.find_by_username(username).await?;
        }
        if user.is_none() {
            if let Some(email) = email {
                user = self.users.find_by_email(email).await?;
            }
        }
        let Some(user) = user else {
            tracing::warn!("login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        let matches =
            spawn_verify_password(user.password_hash.clone(), credentials.password.clone())
                .await?;
        if !matches || user.deactivated {
            tracing::warn!(user_id = %user.user_id, "login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }
        if user.two_factor_enabled {
            let valid = non_empty(credentials.two_fa_code.as_deref())
                .is_some_and(|code| self.two_factor.is_valid(&user, code));
            if !valid {
                tracing::warn!(user_id = %user.user_id, "login rejected: 2FA code");
                return Err(AuthError::InvalidTwoFactorCode);
            }
        }

        let tokens = self.issue_session(&user).await?;
        tracing::info!(user_id = %user.user_id, "login succeeded");
        Ok(AuthSession { tokens, user })
    }

    async fn rotate_inner(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        let record = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        if record.is_expired(now_epoch_ms()) {
            return Err(AuthError::InvalidOrExpiredToken);
        }
        let user = self
            .users
            .find_by_id(&record.user_id)
            .await?
            .filter(|user| !user.deactivated)
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        let claims = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|err| match err {
                TokenError::EmptySecret | TokenError::Signing(_) => {
                    AuthError::Internal(err.to_string())
                }
                _ => AuthError::InvalidOrExpiredToken,
            })?;
        if claims.sub != user.user_id || claims.ver != user.token_version {
            tracing::warn!(user_id = %user.user_id, "refresh token version is stale");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let tokens = self.issue_tokens(&user)?;
        let replacement = refresh_record(&user.user_id, &tokens);
        if !self.refresh_tokens.rotate(refresh_token, replacement).await? {
            tracing::warn!(user_id = %user.user_id, "refresh token already rotated");
            return Err(AuthError::InvalidOrExpiredToken);
        }
        tracing::info!(user_id = %user.user_id, "refresh token rotated");
        Ok(tokens)
    }

    fn issue_tokens(&self, user: &UserRecord) -> Result<IssuedTokens, AuthError> {
        self.codec
            .issue_pair(&user.user_id, &user.roles, user.token_version)
            .map_err(|err| AuthError::Internal(err.to_string()))
    }

    /// 签发 token 对并持久化 refresh 记录。
    async fn issue_session(&self, user: &UserRecord) -> Result<IssuedTokens, AuthError> {
        let tokens = self.issue_tokens(user)?;
        self.refresh_tokens
            .create(refresh_record(&user.user_id, &tokens))
            .await?;
        Ok(tokens)
    }

    async fn require_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// 递增 token 版本并删除全部 refresh token。
    async fn invalidate_sessions(&self, user_id: &str) -> Result<(), AuthError> {
        let version = self
            .users
            .increment_token_version(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        let removed = self.refresh_tokens.delete_all_for_user(user_id).await?;
        tracing::info!(user_id, token_version = version, removed, "sessions invalidated");
        Ok(())
    }

    /// 拉黑请求中携带的 access token；无效或已过期的 token 直接忽略。
    async fn revoke_presented(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = match self.codec.verify_access(access_token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "presented access token not blacklisted");
                return Ok(());
            }
        };
        self.revocations
            .revoke(access_token, remaining_lifetime_ms(claims.exp))
            .await?;
        Ok(())
    }
}

/// token 剩余有效期（毫秒），已过期为 0。
fn remaining_lifetime_ms(exp_seconds: i64) -> u64 {
    exp_seconds
        .saturating_mul(1000)
        .saturating_sub(now_epoch_ms())
        .max(0) as u64
}

fn refresh_record(user_id: &str, tokens: &IssuedTokens) -> RefreshTokenRecord {
    let now = now_epoch_ms();
    RefreshTokenRecord {
        token_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        token: tokens.refresh_token.clone(),
        expires_at_ms: tokens.refresh_expires_at.saturating_mul(1000),
        created_at_ms: now,
        updated_at_ms: now,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// 唯一约束冲突映射为对应的业务错误。
fn conflict_error(err: StorageError) -> AuthError {
    if !err.is_conflict() {
        return AuthError::Internal(err.to_string());
    }
    match err.target() {
        Some(target) if target.contains("email") => AuthError::DuplicateEmail,
        Some(target) if target.contains("username") => AuthError::DuplicateUsername,
        Some(target) if target.contains("phone") => {
            AuthError::Validation("phone number already in use".to_string())
        }
        _ => AuthError::Internal(err.to_string()),
    }
}
