//! # 用户实体定义
//!
//! 用户基础信息表的 Sea-ORM 实体模型（仅包含身份核心需要的字段）

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::StringList;

/// 用户实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// 用户自定义的常用名，优先于 `first_name`
    pub usual_first_name: Option<String>,
    pub usual_full_name: String,
    pub picture: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub roles: StringList,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 对外展示的名（常用名优先）
    #[must_use]
    pub fn given_name(&self) -> &str {
        self.usual_first_name
            .as_deref()
            .unwrap_or(self.first_name.as_str())
    }
}
