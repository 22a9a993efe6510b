// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use crawlrs_worker::domain::models::health::CheckResult;
use crawlrs_worker::domain::services::health_service::{HealthChecker, HealthService};
use crawlrs_worker::presentation::routes;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use crate::helpers::StaticCheck;

async fn get_health(service: HealthService) -> (StatusCode, Option<String>, Value) {
    let app = routes::routes(Arc::new(service));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&body).unwrap())
}

/// 健康检查测试
///
/// 所有检查正常时返回 `ok`，且不输出空的 `message`
#[tokio::test]
async fn health_check_works() {
    let checkers: Vec<Arc<dyn HealthChecker>> = vec![
        Arc::new(StaticCheck::new("amqp", CheckResult::ok())),
        Arc::new(StaticCheck::new("redis", CheckResult::ok())),
    ];

    let (status, content_type, body) = get_health(HealthService::new(checkers)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body,
        json!({
            "status": "ok",
            "checks": {
                "amqp": { "status": "ok" },
                "redis": { "status": "ok" }
            }
        })
    );
}

/// 降级依赖只体现在响应体中，HTTP状态码仍为200
#[tokio::test]
async fn health_check_reports_degraded_dependency() {
    let checkers: Vec<Arc<dyn HealthChecker>> = vec![
        Arc::new(StaticCheck::new("amqp", CheckResult::ok())),
        Arc::new(StaticCheck::new(
            "redis",
            CheckResult::warning("Unexpected ping reply: LOADING"),
        )),
    ];

    let (status, _, body) = get_health(HealthService::new(checkers)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "warning");
    assert_eq!(body["checks"]["redis"]["status"], "warning");
    assert_eq!(
        body["checks"]["redis"]["message"],
        "Unexpected ping reply: LOADING"
    );
}

/// 超时的检查被标记为 `critical`
#[tokio::test(start_paused = true)]
async fn health_check_times_out_slow_dependency() {
    let checkers: Vec<Arc<dyn HealthChecker>> = vec![
        Arc::new(StaticCheck::new("amqp", CheckResult::ok())),
        Arc::new(StaticCheck::slow(
            "redis",
            CheckResult::ok(),
            Duration::from_secs(30),
        )),
    ];
    let service = HealthService::new(checkers).with_timeout(Duration::from_millis(500));

    let (status, _, body) = get_health(service).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "critical");
    assert_eq!(body["checks"]["amqp"]["status"], "ok");
    assert_eq!(body["checks"]["redis"]["status"], "critical");
    assert_eq!(body["checks"]["redis"]["message"], "Check timed out");
}

/// 版本端点
#[tokio::test]
async fn version_endpoint_returns_package_version() {
    let app = routes::routes(Arc::new(HealthService::new(Vec::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/version")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], env!("CARGO_PKG_VERSION").as_bytes());
}
