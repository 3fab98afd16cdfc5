//! # API 响应结构
//!
//! 成功响应的统一 JSON 外壳；错误响应由 `IdentityError` 自身渲染

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    SuccessWithoutData(String),
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = match self {
            Self::Success(data) => SuccessResponse {
                success: true,
                data: Some(data),
                message: None,
                timestamp: Utc::now(),
            },
            Self::SuccessWithoutData(message) => SuccessResponse {
                success: true,
                data: None,
                message: Some(message),
                timestamp: Utc::now(),
            },
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}
