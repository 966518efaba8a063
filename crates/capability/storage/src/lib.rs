//! # Bored Storage 模块
//!
//! 认证能力依赖的凭据存储抽象层，支持内存与 PostgreSQL / Redis 两类后端。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：UserStore / RefreshTokenStore / RevocationStore
//! 2. **数据模型层** (`models.rs`)：UserRecord、NewUser、RefreshTokenRecord
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型，区分唯一约束冲突
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和演示）
//!    - `postgres/`：PostgreSQL 存储实现（用户与 refresh token）
//!    - `redis`：Redis 黑名单实现（access token 吊销）
//!
//! ## 核心约束
//!
//! - refresh token 轮换必须原子：旧记录删除与新记录写入要么都生效，要么都不生效
//! - 黑名单条目带 TTL，不超过对应 access token 的剩余有效期
//! - 不做跨请求缓存，鉴权每次读取用户的当前状态
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use bored_storage::{InMemoryUserStore, UserStore};
//!
//! let users = InMemoryUserStore::new();
//! let user = users.find_by_username("alice").await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod redis;
pub mod traits;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use redis::RedisRevocationStore;
pub use traits::*;

pub use in_memory::{InMemoryRefreshTokenStore, InMemoryRevocationStore, InMemoryUserStore};

pub use postgres::{PgRefreshTokenStore, PgUserStore};
