//! # 应用配置结构定义

use super::{AuthConfig, DatabaseConfig, ENV_CRYPTO_SECRET, ENV_DATABASE_URL, ENV_RBAC_PATH};
use crate::error::{IdentityError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 令牌与会话配置
    pub auth: AuthConfig,
    /// 角色定义
    pub rbac: RbacConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 角色定义文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// YAML 角色定义文件路径
    pub path: PathBuf,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/rbac.yaml"),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，`RUST_LOG` 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文本解析配置（不做验证）
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 应用环境变量覆盖
    ///
    /// `lookup` 通常为 `std::env::var`，测试中可替换
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_CRYPTO_SECRET) {
            self.auth.crypto_secret = secret;
        }
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(path) = lookup(ENV_RBAC_PATH) {
            self.rbac.path = PathBuf::from(path);
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(IdentityError::config("无效的服务器端口: 0"));
        }

        self.database.validate()?;
        self.auth.validate()?;

        crate::ensure_config!(
            !self.rbac.path.as_os_str().is_empty(),
            "rbac.path 不能为空"
        );

        Ok(())
    }
}
