//! 请求鉴权：解析 `Authorization: Bearer <token>` 并得到 AuthContext。
//!
//! 校验顺序：
//! 1. 头缺失或格式不对 → Unauthenticated
//! 2. 签名 / 算法 / claims 校验失败 → Unauthenticated，过期 → TokenExpired
//! 3. 命中黑名单 → Unauthenticated；黑名单存储故障 → Internal
//! 4. 用户不存在、已停用或 token 版本不一致 → Unauthenticated

use crate::jwt::{TokenError, now_epoch_seconds};
use crate::{AuthError, AuthService};
use domain::AuthContext;

/// 从 Authorization 头取出 token：格式必须严格为 `Bearer <token>`，单个空格分隔。
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme != "Bearer" || token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

impl AuthService {
    /// 鉴权一次请求；`authorization` 为 Authorization 头原值。
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        self.bounded("authorize", self.authorize_inner(authorization))
            .await
    }

    async fn authorize_inner(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let header = authorization.ok_or(AuthError::Unauthenticated)?;
        let token = bearer_token(header).ok_or(AuthError::Unauthenticated)?;

        let claims = self.codec.verify_access(token).map_err(|err| match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::EmptySecret | TokenError::Signing(_) => {
                AuthError::Internal(err.to_string())
            }
            TokenError::InvalidSignature | TokenError::Malformed => AuthError::Unauthenticated,
        })?;

        let revoked = self.revocations.is_revoked(token).await.map_err(|err| {
            tracing::error!(error = %err, "revocation lookup failed");
            AuthError::Internal(err.to_string())
        })?;
        if revoked {
            tracing::warn!(user_id = %claims.sub, "blacklisted access token presented");
            return Err(AuthError::Unauthenticated);
        }

        if claims.exp <= now_epoch_seconds() {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "user lookup failed");
                AuthError::Internal(err.to_string())
            })?
            .ok_or(AuthError::Unauthenticated)?;
        if user.deactivated || user.token_version != claims.ver {
            tracing::warn!(user_id = %user.user_id, "stale or deactivated session");
            return Err(AuthError::Unauthenticated);
        }

        Ok(user.to_auth_context(claims.exp))
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn bearer_requires_two_parts() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("  Bearer   abc "), None);
        assert_eq!(bearer_token("Bearer  abc"), None);
        assert_eq!(bearer_token("Bearer abc "), None);
        assert_eq!(bearer_token("Bearer\tabc"), None);
        assert_eq!(bearer_token("Bearer abc\tdef"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token(""), None);
    }
}
