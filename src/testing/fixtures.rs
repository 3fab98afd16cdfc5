//! # 测试数据 Fixtures
//!
//! 提供测试用的数据结构和预设数据

use chrono::{Duration, Utc};
use entity::{StringList, auth_refresh_tokens, auth_tokens, users};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

/// 用户测试数据构建器
pub struct UserFixture {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub usual_first_name: Option<String>,
    pub picture: Option<String>,
    pub roles: Vec<String>,
}

impl UserFixture {
    /// 以用户名创建 fixture，其余字段由用户名推导
    pub fn new(username: &str) -> Self {
        let mut chars = username.chars();
        let first_name = chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect::<String>())
            .unwrap_or_default();
        Self {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name,
            last_name: "Tester".to_string(),
            usual_first_name: None,
            picture: None,
            roles: vec!["user".to_string()],
        }
    }

    /// 设置常用名
    pub fn usual_first_name(mut self, name: &str) -> Self {
        self.usual_first_name = Some(name.to_string());
        self
    }

    /// 设置头像
    pub fn picture(mut self, url: &str) -> Self {
        self.picture = Some(url.to_string());
        self
    }

    /// 设置角色（角色名）
    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(ToString::to_string).collect();
        self
    }

    fn full_name(&self) -> String {
        let first = self.usual_first_name.as_deref().unwrap_or(&self.first_name);
        format!("{first} {}", self.last_name)
    }

    /// 转换为 Sea-ORM ActiveModel
    pub fn to_active_model(self) -> users::ActiveModel {
        let now = Utc::now().naive_utc();
        users::ActiveModel {
            usual_full_name: Set(self.full_name()),
            username: Set(self.username),
            email: Set(self.email),
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            usual_first_name: Set(self.usual_first_name),
            picture: Set(self.picture),
            roles: Set(StringList(self.roles)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    /// 转换为 Model（用于不需要数据库的断言）
    pub fn build_model(self, id: i32) -> users::Model {
        let now = Utc::now().naive_utc();
        users::Model {
            id,
            usual_full_name: self.full_name(),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            usual_first_name: self.usual_first_name,
            picture: self.picture,
            roles: StringList(self.roles),
            created_at: now,
            updated_at: now,
        }
    }

    /// 写入数据库
    pub async fn insert<C: ConnectionTrait>(self, db: &C) -> Result<users::Model, DbErr> {
        self.to_active_model().insert(db).await
    }
}

/// 访问令牌测试数据构建器，直接写库以构造过期等边界状态
pub struct AccessTokenFixture {
    pub id: String,
    pub application_id: String,
    pub subject: String,
    pub refresh_token_id: Option<String>,
    pub scopes: Vec<String>,
    pub expiration: chrono::NaiveDateTime,
}

impl AccessTokenFixture {
    pub fn new(id: &str, subject: &str) -> Self {
        Self {
            id: id.to_string(),
            application_id: "web".to_string(),
            subject: subject.to_string(),
            refresh_token_id: None,
            scopes: vec!["openid".to_string()],
            expiration: Utc::now().naive_utc() + Duration::minutes(5),
        }
    }

    pub fn application(mut self, client_id: &str) -> Self {
        self.application_id = client_id.to_string();
        self
    }

    pub fn paired_with(mut self, refresh_token_id: &str) -> Self {
        self.refresh_token_id = Some(refresh_token_id.to_string());
        self
    }

    pub fn scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(ToString::to_string).collect();
        self
    }

    pub fn expired(mut self) -> Self {
        self.expiration = Utc::now().naive_utc() - Duration::hours(1);
        self
    }

    pub async fn insert<C: ConnectionTrait>(self, db: &C) -> Result<auth_tokens::Model, DbErr> {
        auth_tokens::ActiveModel {
            id: Set(self.id),
            application_id: Set(self.application_id),
            subject: Set(self.subject),
            refresh_token_id: Set(self.refresh_token_id),
            audience: Set(StringList::default()),
            scopes: Set(StringList(self.scopes)),
            expiration: Set(self.expiration),
        }
        .insert(db)
        .await
    }
}

/// 刷新令牌测试数据构建器
pub struct RefreshTokenFixture {
    pub id: String,
    pub subject: String,
    pub application_id: String,
    pub expiration: chrono::NaiveDateTime,
}

impl RefreshTokenFixture {
    pub fn new(id: &str, subject: &str) -> Self {
        Self {
            id: id.to_string(),
            subject: subject.to_string(),
            application_id: "web".to_string(),
            expiration: Utc::now().naive_utc() + Duration::hours(5),
        }
    }

    pub fn application(mut self, client_id: &str) -> Self {
        self.application_id = client_id.to_string();
        self
    }

    pub fn expired(mut self) -> Self {
        self.expiration = Utc::now().naive_utc() - Duration::minutes(1);
        self
    }

    pub async fn insert<C: ConnectionTrait>(
        self,
        db: &C,
    ) -> Result<auth_refresh_tokens::Model, DbErr> {
        auth_refresh_tokens::ActiveModel {
            id: Set(self.id),
            user_id: Set(self.subject.clone()),
            subject: Set(self.subject),
            application_id: Set(self.application_id),
            auth_time: Set(Utc::now().naive_utc()),
            amr: Set(StringList::default()),
            audience: Set(StringList::default()),
            scopes: Set(StringList(vec!["openid".to_string()])),
            expiration: Set(self.expiration),
        }
        .insert(db)
        .await
    }
}
