//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖和验证

mod app_config;
mod auth_config;
mod database;

pub use app_config::{AppConfig, LoggingConfig, RbacConfig, ServerConfig};
pub use auth_config::{
    AuthConfig, CookieConfig, LockMode, MAX_TTL_SECS, SameSitePolicy, TokenConfig, TrustedClient,
};
pub use database::DatabaseConfig;

use crate::error::{IdentityError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// 加密密钥环境变量
pub const ENV_CRYPTO_SECRET: &str = "IDENTITY_CRYPTO_SECRET";
/// 数据库地址环境变量
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// 角色定义文件环境变量
pub const ENV_RBAC_PATH: &str = "IDENTITY_RBAC_PATH";

/// 加载配置文件
///
/// 未显式指定路径时按 `RUST_ENV` 读取 `config/config.{env}.toml`
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_file = path.map_or_else(default_config_path, Path::to_path_buf);

    if !config_file.exists() {
        return Err(IdentityError::config(format!(
            "配置文件不存在: {}",
            config_file.display()
        )));
    }

    let content = std::fs::read_to_string(&config_file).map_err(|e| {
        IdentityError::config_with_source(
            format!("读取配置文件失败: {}", config_file.display()),
            e,
        )
    })?;

    let mut config = AppConfig::from_toml_str(&content)?;
    config.apply_env_overrides(|key| env::var(key).ok());
    config.validate()?;

    tracing::debug!(path = %config_file.display(), "配置加载完成");
    Ok(config)
}

fn default_config_path() -> PathBuf {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    PathBuf::from(format!("config/config.{env}.toml"))
}
