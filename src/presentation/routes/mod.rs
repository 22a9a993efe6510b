// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::health_service::HealthService;
use crate::presentation::handlers::health_handler;
use axum::{extract::Extension, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 健康检查路径
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

/// 创建应用路由
///
/// # 参数
///
/// * `health_service` - 健康聚合服务
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(health_service: Arc<HealthService>) -> Router {
    Router::new()
        .route(HEALTHCHECK_PATH, get(health_handler::health_check))
        .route("/v1/version", get(version))
        .layer(Extension(health_service))
        .layer(TraceLayer::new_for_http())
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
