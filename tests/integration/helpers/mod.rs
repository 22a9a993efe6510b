// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use crawlrs_worker::config::settings::{AmqpSettings, CrawlerSettings, Settings};
use crawlrs_worker::domain::models::health::CheckResult;
use crawlrs_worker::domain::services::health_service::HealthChecker;
use crawlrs_worker::queue::traits::{MessagePublisher, OutboundMessage, QueueError};
use std::sync::Mutex;
use std::time::Duration;

/// 记录所有发布消息的发布器
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<(), QueueError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// 在可选延迟后返回固定结果的健康检查
pub struct StaticCheck {
    pub name: &'static str,
    pub result: CheckResult,
    pub delay: Option<Duration>,
}

impl StaticCheck {
    pub fn new(name: &'static str, result: CheckResult) -> Self {
        Self {
            name,
            result,
            delay: None,
        }
    }

    pub fn slow(name: &'static str, result: CheckResult, delay: Duration) -> Self {
        Self {
            name,
            result,
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl HealthChecker for StaticCheck {
    fn name(&self) -> &str {
        self.name
    }

    async fn check(&self) -> CheckResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// 以给定根URL创建爬虫配置
pub fn crawler_settings(root_url: &str) -> CrawlerSettings {
    CrawlerSettings {
        root_url: root_url.to_string(),
        user_agent: "crawlrs-worker".to_string(),
        request_timeout_secs: 5,
    }
}

/// 默认配置
pub fn default_settings() -> Settings {
    Settings::from_toml("").unwrap()
}

/// 测试代理配置，可通过 `AMQP_URL` 覆盖
pub fn amqp_settings(suffix: &str) -> AmqpSettings {
    let mut settings = default_settings().amqp;
    if let Ok(url) = std::env::var("AMQP_URL") {
        settings.url = url;
    }
    settings.exchange = format!("crawlrs_test_exchange_{}", suffix);
    settings.queue = format!("crawlrs_test_queue_{}", suffix);
    settings
}
