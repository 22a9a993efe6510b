// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
    BasicRejectOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind, Queue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::settings::AmqpSettings;
use crate::domain::models::crawl::Disposition;
use crate::queue::traits::{
    MessagePublisher, OutboundMessage, QueueError, QueueInspector, QueueTopology, SOURCE_URL_HEADER,
};

/// 持久化投递模式
const PERSISTENT_DELIVERY_MODE: u8 = 2;

/// 将配置中的交换机类型映射为AMQP交换机类型
pub fn exchange_kind(exchange_type: &str) -> ExchangeKind {
    match exchange_type.to_ascii_lowercase().as_str() {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "headers" => ExchangeKind::Headers,
        "topic" => ExchangeKind::Topic,
        other => ExchangeKind::Custom(other.to_string()),
    }
}

/// AMQP队列连接
///
/// 每个进程持有一个连接和一个通道。后台监听通道和连接的意外关闭，
/// 并通过 `subscribe_lost` 返回的信号上报，由宿主进程决定退出或重启；
/// 显式调用 `close` 引起的关闭不会触发该信号。
pub struct QueueConnection {
    connection: Connection,
    channel: Channel,
    closing: Arc<AtomicBool>,
    lost: Arc<watch::Sender<Option<String>>>,
}

impl QueueConnection {
    /// 连接到AMQP代理
    ///
    /// 打开一个连接和一个通道，设置预取数量作为背压上限，并开启发布确认
    ///
    /// # 参数
    ///
    /// * `settings` - AMQP配置
    ///
    /// # 返回值
    ///
    /// * `Ok(QueueConnection)` - 连接成功
    /// * `Err(QueueError)` - 无法连接、设置QoS或开启发布确认失败
    pub async fn connect(settings: &AmqpSettings) -> Result<Self, QueueError> {
        let connection = Connection::connect(
            &settings.url,
            ConnectionProperties::default().with_connection_name("crawlrs-worker".into()),
        )
        .await?;

        let channel = connection.create_channel().await?;
        channel
            .basic_qos(settings.prefetch_count, BasicQosOptions::default())
            .await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        let (lost, _) = watch::channel(None);
        let queue_connection = Self {
            connection,
            channel,
            closing: Arc::new(AtomicBool::new(false)),
            lost: Arc::new(lost),
        };
        queue_connection.supervise();

        info!(
            prefetch_count = settings.prefetch_count,
            "Connected to AMQP broker"
        );
        Ok(queue_connection)
    }

    fn supervise(&self) {
        let notifier = |source: &'static str| {
            let closing = self.closing.clone();
            let lost = self.lost.clone();
            move |err: lapin::Error| {
                if closing.load(Ordering::SeqCst) {
                    debug!("AMQP {} closed during shutdown: {}", source, err);
                    return;
                }
                error!("AMQP {} closed unexpectedly: {}", source, err);
                lost.send_replace(Some(format!("{} closed: {}", source, err)));
            }
        };

        self.connection.on_error(notifier("connection"));
        self.channel.on_error(notifier("channel"));
    }

    /// 订阅连接丢失信号
    ///
    /// 值变为 `Some(reason)` 表示连接或通道意外关闭，这是致命错误。
    pub fn subscribe_lost(&self) -> watch::Receiver<Option<String>> {
        self.lost.subscribe()
    }

    /// 连接丢失原因（如果已经丢失）
    pub fn lost_reason(&self) -> Option<String> {
        self.lost.borrow().clone()
    }

    /// 连接和通道是否都处于连接状态
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }

    /// 声明持久化交换机
    pub async fn declare_exchange(&self, name: &str, exchange_type: &str) -> Result<(), QueueError> {
        self.channel
            .exchange_declare(
                name,
                exchange_kind(exchange_type),
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    /// 声明持久化、非独占、不自动删除的队列
    pub async fn declare_queue(&self, name: &str) -> Result<Queue, QueueError> {
        let queue = self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(queue)
    }

    /// 使用绑定键将队列绑定到交换机
    pub async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        binding_key: &str,
    ) -> Result<(), QueueError> {
        self.channel
            .queue_bind(
                queue,
                exchange,
                binding_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    /// 声明完整拓扑（交换机、队列、绑定）
    pub async fn declare_topology(&self, topology: &QueueTopology) -> Result<(), QueueError> {
        self.declare_exchange(&topology.exchange, &topology.exchange_type)
            .await?;
        self.declare_queue(&topology.queue).await?;
        self.bind_queue(&topology.queue, &topology.exchange, &topology.binding_key)
            .await?;

        info!(
            exchange = %topology.exchange,
            queue = %topology.queue,
            binding_key = %topology.binding_key,
            "Queue topology declared"
        );
        Ok(())
    }

    /// 被动声明队列以检查其是否存在
    pub async fn inspect_queue(&self, name: &str) -> Result<Queue, QueueError> {
        let queue = self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(queue)
    }

    /// 开始消费队列
    ///
    /// 手动确认；不是唯一消费者，允许多个工作器实例共享队列；
    /// 不接收本连接发布的消息。
    pub async fn consume(&self, queue: &str) -> Result<Consumer, QueueError> {
        let consumer_tag = format!("crawlrs-worker-{}", Uuid::new_v4());
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &consumer_tag,
                BasicConsumeOptions {
                    no_local: true,
                    no_ack: false,
                    exclusive: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await?;

        info!(queue = %queue, consumer_tag = %consumer_tag, "Consuming queue");
        Ok(consumer)
    }

    /// 显式关闭通道和连接
    pub async fn close(&self) -> Result<(), QueueError> {
        self.closing.store(true, Ordering::SeqCst);
        self.channel.close(200, "Bye").await?;
        self.connection.close(200, "Bye").await?;
        info!("AMQP connection closed");
        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for QueueConnection {
    async fn publish(&self, message: OutboundMessage) -> Result<(), QueueError> {
        let mut headers = FieldTable::default();
        if let Some(url) = &message.source_url {
            headers.insert(
                SOURCE_URL_HEADER.into(),
                AMQPValue::LongString(url.as_str().into()),
            );
        }

        let properties = BasicProperties::default()
            .with_content_type(message.content_type.as_str().into())
            .with_delivery_mode(PERSISTENT_DELIVERY_MODE)
            .with_priority(0)
            .with_headers(headers);

        let confirmation = self
            .channel
            .basic_publish(
                &message.exchange,
                &message.routing_key,
                BasicPublishOptions::default(),
                &message.body,
                properties,
            )
            .await?
            .await?;
        check_confirmation(confirmation, &message.exchange)?;

        debug!(
            exchange = %message.exchange,
            routing_key = %message.routing_key,
            bytes = message.body.len(),
            "Message published"
        );
        Ok(())
    }
}

#[async_trait]
impl QueueInspector for QueueConnection {
    fn lost_reason(&self) -> Option<String> {
        QueueConnection::lost_reason(self)
    }

    async fn inspect(&self, queue: &str) -> Result<String, QueueError> {
        let queue = self.inspect_queue(queue).await?;
        Ok(queue.name().as_str().to_string())
    }
}

/// 只有代理确认（ack）的发布才算成功
///
/// 通道处于确认模式，`NotRequested` 说明确认模式没有生效，同样视为失败
fn check_confirmation(confirmation: Confirmation, exchange: &str) -> Result<(), QueueError> {
    match confirmation {
        Confirmation::Ack(_) => Ok(()),
        Confirmation::Nack(_) => Err(QueueError::PublishNacked(exchange.to_string())),
        Confirmation::NotRequested => Err(QueueError::UnexpectedState(format!(
            "publish to exchange '{}' was not confirmed",
            exchange
        ))),
    }
}

/// 按处置方式确认或拒绝投递
pub async fn settle(delivery: &Delivery, disposition: Disposition) -> Result<(), QueueError> {
    match disposition {
        Disposition::Ack => delivery.acker.ack(BasicAckOptions::default()).await?,
        Disposition::Reject { requeue } => {
            delivery
                .acker
                .reject(BasicRejectOptions { requeue })
                .await?
        }
    }
    Ok(())
}
