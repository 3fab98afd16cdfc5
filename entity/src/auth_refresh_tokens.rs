//! # 刷新令牌实体定义
//!
//! 一次性使用的刷新令牌，每次轮换都会删除旧记录

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::StringList;

/// 刷新令牌实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_refresh_tokens")]
pub struct Model {
    /// 令牌 ID，同时也是发给客户端的不透明值
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject: String,
    pub user_id: String,
    pub application_id: String,
    pub auth_time: DateTime,
    #[sea_orm(column_type = "Json")]
    pub amr: StringList,
    #[sea_orm(column_type = "Json")]
    pub audience: StringList,
    #[sea_orm(column_type = "Json")]
    pub scopes: StringList,
    pub expiration: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 刷新令牌在 `now` 时刻是否仍可使用
    #[must_use]
    pub fn is_active_at(&self, now: DateTime) -> bool {
        self.expiration > now
    }
}
