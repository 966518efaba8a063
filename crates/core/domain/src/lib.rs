pub mod roles;

pub use roles::{RoleTag, UnknownRole, default_roles, parse_roles, roles_to_strings};

use std::collections::BTreeSet;

/// 鉴权上下文：鉴权网关校验通过后挂到请求上的身份信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub roles: BTreeSet<RoleTag>,
    pub token_version: i64,
    /// access token 过期时间（Unix 秒）。
    pub expires_at: i64,
}

impl AuthContext {
    /// 构造显式身份与角色的上下文。
    pub fn new(
        user_id: impl Into<String>,
        roles: BTreeSet<RoleTag>,
        token_version: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
            token_version,
            expires_at,
        }
    }

    pub fn has_role(&self, role: RoleTag) -> bool {
        self.roles.contains(&role)
    }
}
