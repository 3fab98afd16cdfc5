//! # 认证配置
//!
//! 令牌生命周期、可信客户端、Cookie 与写入串行化策略

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 令牌有效期的上限（10 年），防止时间计算溢出
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 引用令牌加密密钥（实际 AES 密钥为其 SHA-256）
    pub crypto_secret: String,
    /// ID Token 签发者
    pub issuer: String,
    /// 内置前端使用的客户端 ID
    pub builtin_client_id: String,
    /// 第一方登录记录的认证方式
    pub amr: Vec<String>,
    /// 认证 Cookie
    pub cookie: CookieConfig,
    /// 令牌生命周期
    pub token: TokenConfig,
    /// 写入串行化方式
    pub lock_mode: LockMode,
    /// 单次存储操作超时（秒）
    pub operation_timeout_secs: u64,
    /// RSA 签名密钥长度
    pub signing_key_bits: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            crypto_secret: String::new(),
            issuer: "http://localhost:8080".to_string(),
            builtin_client_id: "builtin".to_string(),
            amr: vec!["intra42".to_string()],
            cookie: CookieConfig::default(),
            token: TokenConfig::default(),
            lock_mode: LockMode::Global,
            operation_timeout_secs: 10,
            signing_key_bits: 2048,
        }
    }
}

impl AuthConfig {
    pub(super) fn validate(&self) -> Result<()> {
        crate::ensure_config!(
            !self.crypto_secret.is_empty(),
            "auth.crypto_secret 不能为空"
        );
        crate::ensure_config!(
            !self.builtin_client_id.is_empty(),
            "auth.builtin_client_id 不能为空"
        );
        crate::ensure_config!(
            !self.cookie.name.is_empty(),
            "auth.cookie.name 不能为空"
        );
        crate::ensure_config!(
            self.operation_timeout_secs > 0,
            "auth.operation_timeout_secs 必须大于0"
        );
        crate::ensure_config!(
            self.signing_key_bits >= 2048,
            "auth.signing_key_bits 不能小于2048: {}",
            self.signing_key_bits
        );
        self.token.validate()
    }
}

/// SameSite 策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    /// 严格模式（登录时使用）
    #[default]
    Strict,
    /// 宽松模式（登出时使用）
    Lax,
    /// 不限制
    None,
}

impl SameSitePolicy {
    /// `Set-Cookie` 中的取值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// 认证 Cookie 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie 名称
    pub name: String,
    /// 是否只允许 HTTPS 传输
    pub secure: bool,
    /// 登录时的 SameSite 策略
    pub same_site: SameSitePolicy,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "auth".to_string(),
            secure: true,
            same_site: SameSitePolicy::Strict,
        }
    }
}

/// 可信客户端的访问令牌有效期覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedClient {
    /// 客户端 ID
    pub client_id: String,
    /// 访问令牌有效期（秒）
    pub access_token_ttl_secs: u64,
}

/// 令牌生命周期配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// 第三方客户端访问令牌有效期（秒）
    pub access_token_ttl_secs: u64,
    /// 刷新令牌有效期（秒），从最近一次轮换开始计算
    pub refresh_token_ttl_secs: u64,
    /// 授权码有效期（秒）
    pub auth_code_ttl_secs: u64,
    /// 可信客户端列表
    pub trusted_clients: Vec<TrustedClient>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 5 * 60,
            refresh_token_ttl_secs: 5 * 60 * 60,
            auth_code_ttl_secs: 5 * 60,
            trusted_clients: vec![TrustedClient {
                client_id: "builtin".to_string(),
                access_token_ttl_secs: 30 * 24 * 60 * 60,
            }],
        }
    }
}

impl TokenConfig {
    fn validate(&self) -> Result<()> {
        for (name, ttl) in [
            ("access_token_ttl_secs", self.access_token_ttl_secs),
            ("refresh_token_ttl_secs", self.refresh_token_ttl_secs),
            ("auth_code_ttl_secs", self.auth_code_ttl_secs),
        ] {
            crate::ensure_config!(ttl > 0, "auth.token.{} 必须大于0", name);
            crate::ensure_config!(ttl <= MAX_TTL_SECS, "auth.token.{} 超出上限", name);
        }
        for client in &self.trusted_clients {
            crate::ensure_config!(
                !client.client_id.is_empty(),
                "auth.token.trusted_clients 中的 client_id 不能为空"
            );
            crate::ensure_config!(
                client.access_token_ttl_secs > 0 && client.access_token_ttl_secs <= MAX_TTL_SECS,
                "可信客户端 {} 的有效期无效",
                client.client_id
            );
        }
        Ok(())
    }
}

/// 令牌写入的串行化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// 进程级单一互斥锁
    #[default]
    Global,
    /// 按 subject 分片的互斥锁
    PerSubject,
}
