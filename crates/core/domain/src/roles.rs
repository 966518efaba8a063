//! 用户角色标签。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 平台级角色（闭集，线上格式为 snake_case）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    Manager,
    Attendee,
    Admin,
    Viewer,
    Editor,
    BoredUser,
    Moderator,
}

impl RoleTag {
    /// 全部角色。
    pub const ALL: [RoleTag; 7] = [
        RoleTag::Manager,
        RoleTag::Attendee,
        RoleTag::Admin,
        RoleTag::Viewer,
        RoleTag::Editor,
        RoleTag::BoredUser,
        RoleTag::Moderator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Manager => "manager",
            RoleTag::Attendee => "attendee",
            RoleTag::Admin => "admin",
            RoleTag::Viewer => "viewer",
            RoleTag::Editor => "editor",
            RoleTag::BoredUser => "bored_user",
            RoleTag::Moderator => "moderator",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知角色字符串。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for RoleTag {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RoleTag::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownRole(value.to_string()))
    }
}

/// 新注册用户的默认角色集合。
pub fn default_roles() -> BTreeSet<RoleTag> {
    BTreeSet::from([RoleTag::BoredUser])
}

/// 将存储中的角色字符串解析为角色集合（未知角色直接丢弃）。
pub fn parse_roles<I, S>(values: I) -> BTreeSet<RoleTag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|value| value.as_ref().parse().ok())
        .collect()
}

/// 角色集合转换为存储用的字符串列表。
pub fn roles_to_strings(roles: &BTreeSet<RoleTag>) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}
