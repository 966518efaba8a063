//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误：
//! - SQL / Redis 执行错误
//! - 连接错误
//! - 唯一约束冲突（用户名、邮箱、手机号、refresh token 值）

/// 存储错误分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageErrorKind {
    /// 违反唯一约束。
    Conflict,
    Other,
}

#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    message: String,
    target: Option<String>,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: StorageErrorKind::Other,
            message: message.into(),
            target: None,
        }
    }

    /// 唯一约束冲突，`target` 为冲突的字段或约束名。
    pub fn conflict(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            kind: StorageErrorKind::Conflict,
            message: format!("unique constraint violated: {target}"),
            target: Some(target),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StorageErrorKind::Conflict
    }

    /// 冲突字段或约束名（仅 Conflict 有值）。
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::conflict(db_err.constraint().unwrap_or("unknown"));
            }
        }
        Self::new(err.to_string())
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::new(err.to_string())
    }
}
