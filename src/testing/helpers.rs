//! # 测试辅助函数
//!
//! 提供通用的测试工具和辅助函数

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::{Arc, Once, OnceLock};
use tempfile::TempDir;

use crate::app::AppContext;
use crate::auth::SigningKeyProvider;
use crate::config::AppConfig;
use crate::rbac::Rbac;

static INIT: Once = Once::new();
static SIGNING_KEY: OnceLock<SigningKeyProvider> = OnceLock::new();

/// 测试用加密密钥
pub const TEST_CRYPTO_SECRET: &str = "test-crypto-secret";

/// 测试用角色定义：admin 继承 user
pub const TEST_RBAC_YAML: &str = r#"
roles:
  user:
    name: user
    description: Regular player
    permissions:
      - path: /me
        methods: [GET]
      - path: /me/permissions
        methods: [GET]
      - path: /tournaments/*
        methods: [GET]
  admin:
    name: admin
    description: Platform administrator
    inherits: [user]
    permissions:
      - path: /roles
        methods: [GET]
      - path: /tournaments/*
        methods: ["*"]
"#;

/// 初始化测试日志
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建内存数据库连接并执行迁移
///
/// 内存库只能有一个连接，否则每个连接看到的是不同的数据库
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    migration::Migrator::up(&db, None).await?;

    Ok(db)
}

/// 创建临时数据库文件
pub async fn create_temp_db() -> Result<(DatabaseConnection, TempDir), DbErr> {
    let temp_dir = tempfile::tempdir()
        .map_err(|e| DbErr::Custom(format!("创建临时目录失败: {e}")))?;

    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;

    Ok((db, temp_dir))
}

/// 进程内共享的签名密钥（生成 RSA 密钥较慢，只生成一次）
pub fn test_signing_key() -> &'static SigningKeyProvider {
    SIGNING_KEY.get_or_init(|| {
        SigningKeyProvider::generate(1024).expect("生成测试签名密钥失败")
    })
}

/// 测试配置
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.crypto_secret = TEST_CRYPTO_SECRET.to_string();
    config.auth.cookie.secure = false;
    config
}

/// 测试角色引擎
#[must_use]
pub fn test_rbac() -> Rbac {
    Rbac::from_yaml_str(TEST_RBAC_YAML).expect("测试角色定义无效")
}

/// 基于内存数据库构建完整的应用上下文
pub async fn create_test_context() -> AppContext {
    init_test_env();
    let db = create_test_db().await.expect("创建测试数据库失败");
    AppContext::new(
        test_config(),
        Arc::new(db),
        Arc::new(test_rbac()),
        Arc::new(test_signing_key().clone()),
    )
}
