//! # 访问令牌实体定义
//!
//! 不透明引用令牌在服务端的记录，删除即吊销

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::StringList;

/// 访问令牌实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// 签发目标客户端
    pub application_id: String,
    pub subject: String,
    /// 配对的刷新令牌（仅访问令牌签发时为空）
    pub refresh_token_id: Option<String>,
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
    /// 令牌在 `now` 时刻是否仍有效（过期时间必须严格晚于当前时间）
    #[must_use]
    pub fn is_active_at(&self, now: DateTime) -> bool {
        self.expiration > now
    }
}
