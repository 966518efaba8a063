//! 内存存储实现模块
//!
//! 用于本地演示和测试，进程重启即丢失。
//!
//! 包含以下实现：
//! - UserStore: InMemoryUserStore
//! - RefreshTokenStore: InMemoryRefreshTokenStore
//! - RevocationStore: InMemoryRevocationStore

pub mod refresh_token;
pub mod revocation;
pub mod user;

pub use refresh_token::*;
pub use revocation::*;
pub use user::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// 当前时间戳（毫秒）。
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
