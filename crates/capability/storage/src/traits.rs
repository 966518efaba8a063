//! 存储接口 Trait 定义
//!
//! 定义认证能力依赖的三个外部协作者：
//! - UserStore：用户凭据存储
//! - RefreshTokenStore：refresh token 会话存储
//! - RevocationStore：access token 黑名单（带过期时间的键值存储）
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 不做跨请求缓存，每次调用读取当前真实状态

use crate::error::StorageError;
use crate::models::{NewUser, RefreshTokenRecord, UserRecord};
use async_trait::async_trait;

/// 用户存储接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 根据用户 ID 查找用户
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 用户总数（首个注册用户授予 admin）
    async fn count_users(&self) -> Result<u64, StorageError>;

    /// 列出全部用户（按创建时间升序）
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// 创建用户，用户名/邮箱/手机号冲突时返回 Conflict
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError>;

    /// 标记邮箱已验证，返回更新后的记录；用户不存在返回 None
    async fn set_email_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 标记手机号已验证，返回更新后的记录；用户不存在返回 None
    async fn set_phone_verified(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 开启 2FA，返回更新后的记录；用户不存在返回 None
    async fn enable_two_factor(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 替换口令哈希并在同一次写入中递增 token 版本，返回新版本。
    ///
    /// 仅当库中哈希仍等于 `current_hash` 时生效；哈希已被并发修改或用户不存在返回 None。
    async fn update_password_hash(
        &self,
        user_id: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<i64>, StorageError>;

    /// 停用账号并在同一次写入中递增 token 版本，返回新版本；用户不存在返回 None
    async fn deactivate(&self, user_id: &str) -> Result<Option<i64>, StorageError>;

    /// 删除用户，返回是否删除了记录
    async fn delete_user(&self, user_id: &str) -> Result<bool, StorageError>;

    /// 原子递增 token 版本号，返回新版本；用户不存在返回 None
    async fn increment_token_version(&self, user_id: &str) -> Result<Option<i64>, StorageError>;
}

/// refresh token 存储接口
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// 保存新的 refresh token 记录
    async fn create(&self, record: RefreshTokenRecord) -> Result<(), StorageError>;

    /// 按 token 值查找记录（不做过期过滤，由调用方判断）
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StorageError>;

    /// 按 token 值删除，返回是否删除了记录
    async fn delete_by_token(&self, token: &str) -> Result<bool, StorageError>;

    /// 删除用户的全部 refresh token，返回删除数量
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, StorageError>;

    /// 轮换：删除旧 token 并写入新记录，两步原子完成。
    ///
    /// 旧 token 不存在或已过期时不写入新记录并返回 `false`；
    /// 并发轮换同一个旧 token 时至多一个返回 `true`。
    async fn rotate(
        &self,
        old_token: &str,
        replacement: RefreshTokenRecord,
    ) -> Result<bool, StorageError>;
}

/// access token 吊销存储接口
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// 将 token 写入黑名单，`ttl_ms` 到期后自动失效；`ttl_ms == 0` 不写入
    async fn revoke(&self, token: &str, ttl_ms: u64) -> Result<(), StorageError>;

    /// token 是否在黑名单中
    async fn is_revoked(&self, token: &str) -> Result<bool, StorageError>;
}
