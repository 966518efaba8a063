//! 数据模型
//!
//! 定义凭据存储相关的数据结构：
//! - 用户模型：UserRecord, NewUser
//! - 会话模型：RefreshTokenRecord

use domain::{AuthContext, RoleTag};
use std::collections::BTreeSet;

/// 用户记录。
///
/// `password_hash` 只在存储层与认证能力之间流转，不对外序列化。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub token_version: i64,
    pub roles: BTreeSet<RoleTag>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub two_factor_enabled: bool,
    pub deactivated: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl UserRecord {
    /// 将用户记录转换为鉴权上下文。
    pub fn to_auth_context(&self, expires_at: i64) -> AuthContext {
        AuthContext::new(
            self.user_id.clone(),
            self.roles.clone(),
            self.token_version,
            expires_at,
        )
    }

    pub fn has_role(&self, role: RoleTag) -> bool {
        self.roles.contains(&role)
    }
}

/// 用户创建输入（注册）。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub roles: BTreeSet<RoleTag>,
}

/// refresh token 持久化记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at_ms: i64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl RefreshTokenRecord {
    /// 过期判断（惰性过期，无后台清理）。
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}
