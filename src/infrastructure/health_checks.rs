// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::models::health::CheckResult;
use crate::domain::repositories::dedup_repository::DedupRepository;
use crate::domain::services::health_service::HealthChecker;
use crate::queue::traits::QueueInspector;

/// 消息队列健康检查
///
/// 连接已丢失或被动声明失败时为 `critical`
pub struct QueueHealthCheck {
    inspector: Arc<dyn QueueInspector>,
    queue: String,
}

impl QueueHealthCheck {
    pub fn new(inspector: Arc<dyn QueueInspector>, queue: impl Into<String>) -> Self {
        Self {
            inspector,
            queue: queue.into(),
        }
    }
}

#[async_trait]
impl HealthChecker for QueueHealthCheck {
    fn name(&self) -> &str {
        "amqp"
    }

    async fn check(&self) -> CheckResult {
        if let Some(reason) = self.inspector.lost_reason() {
            return CheckResult::critical(reason);
        }

        match self.inspector.inspect(&self.queue).await {
            Ok(name) if name == self.queue => CheckResult::ok(),
            Ok(name) => CheckResult::critical(format!(
                "Expected queue '{}', broker returned '{}'",
                self.queue, name
            )),
            Err(e) => CheckResult::critical(e.to_string()),
        }
    }
}

/// 去重存储健康检查
///
/// 回复不是 `PONG` 时为 `warning`，请求失败时为 `critical`
pub struct DedupHealthCheck {
    store: Arc<dyn DedupRepository>,
}

impl DedupHealthCheck {
    pub fn new(store: Arc<dyn DedupRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthChecker for DedupHealthCheck {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> CheckResult {
        match self.store.ping().await {
            Ok(reply) if reply == "PONG" => CheckResult::ok(),
            Ok(reply) => CheckResult::warning(format!("Unexpected ping reply: {}", reply)),
            Err(e) => CheckResult::critical(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::crawl::DedupKey;
    use crate::domain::models::health::Severity;
    use crate::domain::repositories::dedup_repository::DedupError;
    use crate::queue::traits::QueueError;
    use mockall::mock;
    use std::time::Duration;

    struct FakeInspector {
        lost: Option<String>,
        reply: Result<String, String>,
    }

    #[async_trait]
    impl QueueInspector for FakeInspector {
        fn lost_reason(&self) -> Option<String> {
            self.lost.clone()
        }

        async fn inspect(&self, _queue: &str) -> Result<String, QueueError> {
            self.reply.clone().map_err(QueueError::UnexpectedState)
        }
    }

    mock! {
        Store {}

        #[async_trait]
        impl DedupRepository for Store {
            async fn exists(&self, key: &DedupKey) -> Result<bool, DedupError>;
            async fn add(&self, key: &DedupKey, ttl: Duration) -> Result<bool, DedupError>;
            async fn remove(&self, key: &DedupKey) -> Result<(), DedupError>;
            async fn ping(&self) -> Result<String, DedupError>;
        }
    }

    fn queue_check(lost: Option<&str>, reply: Result<&str, &str>) -> QueueHealthCheck {
        QueueHealthCheck::new(
            Arc::new(FakeInspector {
                lost: lost.map(str::to_string),
                reply: reply.map(str::to_string).map_err(str::to_string),
            }),
            "crawler_queue",
        )
    }

    #[tokio::test]
    async fn test_queue_check_ok_when_queue_matches() {
        let check = queue_check(None, Ok("crawler_queue"));
        assert_eq!(check.name(), "amqp");
        assert_eq!(check.check().await, CheckResult::ok());
    }

    #[tokio::test]
    async fn test_queue_check_critical_on_mismatch_or_error() {
        let mismatch = queue_check(None, Ok("other_queue")).check().await;
        assert_eq!(mismatch.status, Severity::Critical);

        let failed = queue_check(None, Err("NOT_FOUND")).check().await;
        assert_eq!(failed.status, Severity::Critical);
        assert!(failed.message.unwrap().contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_queue_check_critical_when_connection_lost() {
        let result = queue_check(Some("channel closed: reset"), Ok("crawler_queue"))
            .check()
            .await;
        assert_eq!(result, CheckResult::critical("channel closed: reset"));
    }

    #[tokio::test]
    async fn test_dedup_check_severities() {
        let mut pong = MockStore::new();
        pong.expect_ping().returning(|| Ok("PONG".to_string()));
        let check = DedupHealthCheck::new(Arc::new(pong));
        assert_eq!(check.name(), "redis");
        assert_eq!(check.check().await, CheckResult::ok());

        let mut odd = MockStore::new();
        odd.expect_ping().returning(|| Ok("LOADING".to_string()));
        let result = DedupHealthCheck::new(Arc::new(odd)).check().await;
        assert_eq!(result.status, Severity::Warning);

        let mut down = MockStore::new();
        down.expect_ping()
            .returning(|| Err(DedupError::Backend("connection refused".to_string())));
        let result = DedupHealthCheck::new(Arc::new(down)).check().await;
        assert_eq!(result.status, Severity::Critical);
        assert!(result.message.unwrap().contains("connection refused"));
    }
}
