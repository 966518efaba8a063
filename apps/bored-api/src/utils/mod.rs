//! 工具模块：响应构造、cookie、输入校验、请求体提取

pub mod cookies;
pub mod extract;
pub mod response;
pub mod validation;
