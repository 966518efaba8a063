//! 一次性验证码校验（2FA、手机号验证）。

use bored_storage::UserRecord;
use subtle::ConstantTimeEq;

/// 验证码校验器，纯判断，不产生副作用。
pub trait CodeVerifier: Send + Sync {
    fn is_valid(&self, user: &UserRecord, code: &str) -> bool;
}

/// 与配置的固定验证码做常量时间比较；未配置时拒绝一切输入。
#[derive(Debug, Clone, Default)]
pub struct StaticCode {
    code: Option<String>,
}

impl StaticCode {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            code: (!code.is_empty()).then_some(code),
        }
    }

    pub fn disabled() -> Self {
        Self { code: None }
    }

    pub fn from_option(code: Option<String>) -> Self {
        code.map(Self::new).unwrap_or_default()
    }
}

impl CodeVerifier for StaticCode {
    fn is_valid(&self, _user: &UserRecord, code: &str) -> bool {
        match &self.code {
            Some(expected) => expected.as_bytes().ct_eq(code.as_bytes()).into(),
            None => false,
        }
    }
}
