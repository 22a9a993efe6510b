// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

use crate::config::settings::{AmqpSettings, PublishSettings};

/// 转发消息中携带来源URL的头
pub const SOURCE_URL_HEADER: &str = "x-crawl-url";

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// AMQP协议错误
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// 连接意外断开
    #[error("Queue connection lost: {0}")]
    ConnectionLost(String),

    /// 代理否认了发布确认，消息未被接收
    #[error("Publish to exchange '{0}' was nacked by the broker")]
    PublishNacked(String),

    /// 队列检查结果不符合预期
    #[error("Unexpected queue state: {0}")]
    UnexpectedState(String),
}

/// 队列拓扑
///
/// 启动时声明一次，运行期间不再修改。交换机和队列都是持久化的。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueTopology {
    /// 交换机名称
    pub exchange: String,
    /// 交换机类型
    pub exchange_type: String,
    /// 队列名称
    pub queue: String,
    /// 绑定键
    pub binding_key: String,
}

impl From<&AmqpSettings> for QueueTopology {
    fn from(settings: &AmqpSettings) -> Self {
        Self {
            exchange: settings.exchange.clone(),
            exchange_type: settings.exchange_type.clone(),
            queue: settings.queue.clone(),
            binding_key: settings.binding_key.clone(),
        }
    }
}

/// 待发布的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// 目标交换机
    pub exchange: String,
    /// 路由键
    pub routing_key: String,
    /// 内容类型
    pub content_type: String,
    /// 消息体
    pub body: Bytes,
    /// 来源URL，写入 `x-crawl-url` 头
    pub source_url: Option<String>,
}

impl OutboundMessage {
    /// 创建新的待发布消息
    pub fn new(
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            content_type: content_type.into(),
            body: body.into(),
            source_url: None,
        }
    }

    /// 设置来源URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// 按转发配置构建内容消息
    pub fn forward(settings: &PublishSettings, content_type: &str, body: Bytes) -> Self {
        Self::new(
            settings.exchange.clone(),
            settings.routing_key.clone(),
            content_type,
            body,
        )
    }
}

/// 消息发布特质
///
/// 以持久化模式发布消息。发布不是事务性的：崩溃可能导致下游重复收到内容。
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// 发布消息
    async fn publish(&self, message: OutboundMessage) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: MessagePublisher + ?Sized> MessagePublisher for Arc<T> {
    async fn publish(&self, message: OutboundMessage) -> Result<(), QueueError> {
        (**self).publish(message).await
    }
}

/// 队列探测特质
///
/// 健康检查通过该能力确认连接仍然存活且队列存在
#[async_trait]
pub trait QueueInspector: Send + Sync {
    /// 连接丢失原因（如果已经丢失）
    fn lost_reason(&self) -> Option<String>;

    /// 被动检查队列，返回代理确认的队列名称
    async fn inspect(&self, queue: &str) -> Result<String, QueueError>;
}
