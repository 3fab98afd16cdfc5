//! # 字符串列表 JSON 列
//!
//! audience / scopes / amr / roles 等列以 JSON 数组形式存储

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// 以 JSON 数组持久化的字符串列表
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// 是否包含给定值
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|item| item == value)
    }

    /// 借用为切片
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// 取出内部列表
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for StringList {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<&[String]> for StringList {
    fn from(values: &[String]) -> Self {
        Self(values.to_vec())
    }
}
