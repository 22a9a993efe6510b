// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::models::health::AggregateStatus;
use crate::domain::services::health_service::HealthService;
use crate::presentation::errors::AppError;

/// 健康检查端点
///
/// 每次请求都重新执行所有检查。依赖降级不会改变HTTP状态码，
/// 只体现在响应体的 `status` 字段中；编码失败时返回500。
pub async fn health_check(
    Extension(health_service): Extension<Arc<HealthService>>,
) -> Result<Response, AppError> {
    let status = health_service.status().await;
    encode_status(&status)
}

/// 将聚合状态编码为JSON响应
pub fn encode_status(status: &AggregateStatus) -> Result<Response, AppError> {
    let body = serde_json::to_vec(status)
        .map_err(|e| anyhow::anyhow!("Cannot encode response data: {}", e))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
