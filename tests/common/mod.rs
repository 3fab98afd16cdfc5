//! 集成测试公共设施

#![allow(dead_code)]

use chrono::Utc;
use entity::{StringList, users};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tourney_identity::app::AppContext;
use tourney_identity::auth::SigningKeyProvider;
use tourney_identity::config::AppConfig;
use tourney_identity::rbac::Rbac;

static SIGNING_KEY: OnceLock<SigningKeyProvider> = OnceLock::new();

pub const CRYPTO_SECRET: &str = "integration-secret";

/// 迁移完成的内存数据库（单连接）
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("连接内存数据库失败");
    migration::Migrator::up(&db, None).await.expect("迁移失败");
    Arc::new(db)
}

pub fn signing_key() -> Arc<SigningKeyProvider> {
    Arc::new(
        SIGNING_KEY
            .get_or_init(|| SigningKeyProvider::generate(1024).expect("生成签名密钥失败"))
            .clone(),
    )
}

/// 仓库自带的角色定义
pub fn bundled_rbac() -> Rbac {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/rbac.yaml");
    Rbac::from_path(&path).expect("加载 config/rbac.yaml 失败")
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.crypto_secret = CRYPTO_SECRET.to_string();
    config
}

pub async fn setup_context() -> AppContext {
    AppContext::new(test_config(), setup_db().await, Arc::new(bundled_rbac()), signing_key())
}

/// 插入用户，返回其 id
pub async fn insert_user(db: &DatabaseConnection, username: &str, roles: &[&str]) -> i32 {
    let now = Utc::now().naive_utc();
    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@tourney.test")),
        first_name: Set(username.to_string()),
        last_name: Set("Player".to_string()),
        usual_first_name: Set(None),
        usual_full_name: Set(format!("{username} Player")),
        picture: Set(None),
        roles: Set(StringList(roles.iter().map(ToString::to_string).collect())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.expect("插入用户失败").id
}
