//! # 错误类型定义

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use super::ErrorCategory;

/// 身份核心对外暴露的稳定错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 凭证缺失、无法解密或已过期
    Unauthorized,
    /// 凭证有效但 scope 或角色权限不足
    Forbidden,
    /// 刷新令牌不存在或已被轮换
    InvalidRefreshToken,
    /// 客户端与令牌的签发客户端不一致
    InvalidClient,
    /// 吊销或查询时令牌不存在
    AccessDenied,
    /// 请求参数不被支持
    InvalidRequest,
    /// 存储或内部错误
    ServerError,
}

impl ErrorKind {
    /// 协议层使用的错误代码
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::InvalidRefreshToken => "invalid_grant",
            Self::InvalidClient => "invalid_client",
            Self::AccessDenied => "access_denied",
            Self::InvalidRequest => "invalid_request",
            Self::ServerError => "server_error",
        }
    }

    /// 对应的 HTTP 状态码
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidClient => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::InvalidRefreshToken | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给调用方的固定描述，不包含任何内部标识
    #[must_use]
    pub const fn public_description(self) -> &'static str {
        match self {
            Self::Unauthorized => "missing, malformed or expired credential",
            Self::Forbidden => "insufficient scope or permission",
            Self::InvalidRefreshToken => "invalid refresh token",
            Self::InvalidClient => "token was not issued for this client",
            Self::AccessDenied => "token not found",
            Self::InvalidRequest => "unsupported request",
            Self::ServerError => "internal server error",
        }
    }
}

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum IdentityError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 未认证
    #[error("未认证: {message}")]
    Unauthorized {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 权限不足
    #[error("权限不足: {message}")]
    Forbidden { message: String },

    /// 无效的刷新令牌
    #[error("无效的刷新令牌: {message}")]
    InvalidRefreshToken { message: String },

    /// 客户端不匹配
    #[error("无效的客户端: {message}")]
    InvalidClient { message: String },

    /// 访问被拒绝
    #[error("访问被拒绝: {message}")]
    AccessDenied { message: String },

    /// 不支持的请求
    #[error("无效的请求: {message}")]
    InvalidRequest { message: String },

    /// 服务端内部错误
    #[error("内部错误: {message}")]
    ServerError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 操作超时
    #[error("操作超时: {message} ({timeout_seconds}s)")]
    Timeout {
        message: String,
        timeout_seconds: u64,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<IdentityError>,
    },
}

impl IdentityError {
    /// 错误的稳定类别
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidRefreshToken { .. } => ErrorKind::InvalidRefreshToken,
            Self::InvalidClient { .. } => ErrorKind::InvalidClient,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::ServerError { .. }
            | Self::Timeout { .. } => ErrorKind::ServerError,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// 错误归属（客户端 / 服务端）
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.kind().status().is_server_error() {
            ErrorCategory::Server
        } else {
            ErrorCategory::Client
        }
    }

    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        let kind = self.kind();
        (kind.status(), kind.code())
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T, E>(message: T, source: E) -> Self
    where
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T, E>(message: T, source: E) -> Self
    where
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建未认证错误
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的未认证错误
    pub fn unauthorized_with_source<T, E>(message: T, source: E) -> Self
    where
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::Unauthorized {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建权限不足错误
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// 创建无效刷新令牌错误
    pub fn invalid_refresh_token<T: Into<String>>(message: T) -> Self {
        Self::InvalidRefreshToken {
            message: message.into(),
        }
    }

    /// 创建客户端不匹配错误
    pub fn invalid_client<T: Into<String>>(message: T) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// 创建访问被拒绝错误
    pub fn access_denied<T: Into<String>>(message: T) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// 创建无效请求错误
    pub fn invalid_request<T: Into<String>>(message: T) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn server_error<T: Into<String>>(message: T) -> Self {
        Self::ServerError {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn server_error_with_source<T, E>(message: T, source: E) -> Self
    where
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::ServerError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建超时错误
    pub fn timeout<T: Into<String>>(message: T, timeout_seconds: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_seconds,
        }
    }
}

/// 对外的错误响应体
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    error_description: &'static str,
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::ServerError {
            tracing::error!(error = %self, "request failed with server error");
        } else {
            tracing::debug!(error = %self, code = kind.code(), "request rejected");
        }
        let body = ErrorBody {
            error: kind.code(),
            error_description: kind.public_description(),
        };
        (kind.status(), Json(body)).into_response()
    }
}

impl From<std::io::Error> for IdentityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for IdentityError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_yaml::Error> for IdentityError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("角色定义解析失败", err)
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for IdentityError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// JWT错误转换
impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::server_error_with_source("JWT签名失败", err)
    }
}

impl From<rsa::Error> for IdentityError {
    fn from(err: rsa::Error) -> Self {
        Self::server_error_with_source("RSA密钥处理失败", err)
    }
}
