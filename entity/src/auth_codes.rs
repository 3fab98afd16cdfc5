//! # 授权码实体定义
//!
//! 授权请求被批准后保存的一次性授权码

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 授权码实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_codes")]
pub struct Model {
    /// 授权码本身
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub auth_request_id: String,
    pub expiration: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 授权码在 `now` 时刻是否仍可兑换
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime) -> bool {
        self.expiration > now
    }
}
