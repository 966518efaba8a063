//! # PostgreSQL 存储实现模块
//!
//! 生产环境使用的凭据存储实现。
//!
//! ## 包含的实现
//!
//! - **UserStore** (`user.rs`)：用户表读写、token 版本号递增
//! - **RefreshTokenStore** (`refresh_token.rs`)：refresh token 会话，事务内轮换
//!
//! ## 数据库模式要求
//!
//! 表结构见仓库根目录 `migrations/0001_auth.sql`：
//! - `users`：username / email / phone_number 唯一约束
//! - `refresh_tokens`：token 唯一约束，`user_id` 外键级联删除
//!
//! ## 时间字段
//!
//! 写入时以毫秒时间戳 `to_timestamp($n / 1000.0)` 转换，读取时统一返回 `*_ms`。
//!
//! ## 错误处理
//!
//! 唯一约束冲突转换为 `StorageError::conflict(约束名)`，其余 sqlx 错误原样包装。
//! 事务在 future 被丢弃时自动回滚。

pub mod refresh_token;
pub mod user;

pub use refresh_token::*;
pub use user::*;
