// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::Consumer;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::settings::{DedupFailurePolicy, PublishSettings, RedirectPolicy, Settings};
use crate::domain::models::crawl::{CrawlOutcome, CrawlRequest, DedupKey, Disposition};
use crate::domain::repositories::dedup_repository::DedupRepository;
use crate::engines::traits::CrawlEngine;
use crate::infrastructure::metrics::{
    CRAWL_DURATION_SECONDS, DEDUP_ERRORS_TOTAL, DEDUP_HITS_TOTAL, DISPOSITIONS_TOTAL,
    OUTCOMES_TOTAL, PUBLISHED_TOTAL,
};
use crate::queue::amqp_connection::settle;
use crate::queue::traits::{MessagePublisher, OutboundMessage};

/// 重新入队的重定向目标使用的内容类型
const REDIRECT_TARGET_CONTENT_TYPE: &str = "text/plain";

/// 爬取工作器选项
#[derive(Debug, Clone)]
pub struct CrawlWorkerOptions {
    /// 去重键前缀
    pub key_prefix: String,
    /// 去重记录过期时间
    pub ttl: Duration,
    /// 去重存储失败策略
    pub failure_policy: DedupFailurePolicy,
    /// 重定向处理策略
    pub redirect_policy: RedirectPolicy,
    /// 内容转发目标
    pub publish: PublishSettings,
    /// 入站交换机（重定向目标重新入队时使用）
    pub inbound_exchange: String,
    /// 入站路由键
    pub inbound_routing_key: String,
}

impl CrawlWorkerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            key_prefix: settings.dedup.key_prefix.clone(),
            ttl: settings.dedup.ttl(),
            failure_policy: settings.dedup.failure_policy,
            redirect_policy: settings.worker.redirect_policy,
            publish: settings.publish.clone(),
            inbound_exchange: settings.amqp.exchange.clone(),
            inbound_routing_key: settings.amqp.binding_key.clone(),
        }
    }
}

/// 爬取工作器
///
/// 每条投递经历 `收到 → 爬取 → 分类 → {已去重 | 转发} → 确认 | 拒绝`。
/// 分类结果到处置方式的映射：
///
/// | 结果 | 处置 |
/// |---|---|
/// | `NonLocalHost` | 拒绝，不重新入队 |
/// | `Retryable` | 拒绝并重新入队 |
/// | `NotFound` | 确认 |
/// | `Redirect` | 确认（可选将目标重新入队） |
/// | `TransportError` | 拒绝并重新入队 |
/// | `Success` | 已存在则确认；否则记录、转发后确认 |
///
/// 暂时性失败通过代理的重新投递重试，工作器内部不做重试循环。
pub struct CrawlWorker {
    engine: Arc<dyn CrawlEngine>,
    dedup: Arc<dyn DedupRepository>,
    publisher: Arc<dyn MessagePublisher>,
    options: CrawlWorkerOptions,
}

impl CrawlWorker {
    /// 创建新的爬取工作器实例
    pub fn new(
        engine: Arc<dyn CrawlEngine>,
        dedup: Arc<dyn DedupRepository>,
        publisher: Arc<dyn MessagePublisher>,
        options: CrawlWorkerOptions,
    ) -> Self {
        Self {
            engine,
            dedup,
            publisher,
            options,
        }
    }

    /// 消费投递直到消费者流结束
    ///
    /// 同时处理的投递数量不超过 `concurrency`，与预取数量保持一致，
    /// 背压由代理负责
    ///
    /// # 参数
    ///
    /// * `consumer` - AMQP消费者
    /// * `concurrency` - 最大并发数
    pub async fn run(&self, consumer: Consumer, concurrency: usize) {
        info!(
            engine = self.engine.name(),
            concurrency, "Crawl worker started"
        );

        consumer
            .for_each_concurrent(concurrency.max(1), |delivery| async move {
                match delivery {
                    Ok(delivery) => self.process_delivery(delivery).await,
                    Err(e) => error!("Failed to receive delivery: {}", e),
                }
            })
            .await;

        info!("Consumer stream ended, crawl worker stopped");
    }

    /// 处理并结算一条AMQP投递
    pub async fn process_delivery(&self, delivery: Delivery) {
        let disposition = self.process(delivery.delivery_tag, &delivery.data).await;
        if let Err(e) = settle(&delivery, disposition).await {
            error!(
                delivery_tag = delivery.delivery_tag,
                "Failed to settle delivery as {}: {}",
                disposition.label(),
                e
            );
        }
    }

    /// 解析消息体并处理
    ///
    /// 无法解析为URL的消息体是永久错误，拒绝且不重新入队
    ///
    /// # 参数
    ///
    /// * `delivery_tag` - 投递标签
    /// * `body` - 消息体
    ///
    /// # 返回值
    ///
    /// 投递的处置方式
    pub async fn process(&self, delivery_tag: u64, body: &[u8]) -> Disposition {
        let disposition = match CrawlRequest::from_delivery(delivery_tag, body) {
            Ok(request) => self.handle(&request).await,
            Err(e) => {
                warn!(delivery_tag, "Rejecting malformed delivery: {}", e);
                Disposition::Reject { requeue: false }
            }
        };

        counter!(DISPOSITIONS_TOTAL, "disposition" => disposition.label()).increment(1);
        disposition
    }

    /// 爬取请求并按分类结果决定处置方式
    #[instrument(skip(self, request), fields(delivery_tag = request.delivery_tag, url = %request.url))]
    pub async fn handle(&self, request: &CrawlRequest) -> Disposition {
        let start = Instant::now();
        let outcome = self.engine.crawl(&request.url).await;
        histogram!(CRAWL_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        counter!(OUTCOMES_TOTAL, "outcome" => outcome.label()).increment(1);

        match outcome {
            CrawlOutcome::Success { body, content_type } => {
                self.forward(request, body, &content_type).await
            }
            CrawlOutcome::NonLocalHost => {
                warn!("{}", CrawlOutcome::NonLocalHost);
                Disposition::Reject { requeue: false }
            }
            outcome @ CrawlOutcome::Retryable { .. } => {
                warn!("{}", outcome);
                Disposition::Reject { requeue: true }
            }
            CrawlOutcome::NotFound => {
                info!("{}", CrawlOutcome::NotFound);
                Disposition::Ack
            }
            CrawlOutcome::Redirect { location } => {
                self.handle_redirect(request, location.as_deref()).await
            }
            outcome @ CrawlOutcome::TransportError { .. } => {
                warn!("{}", outcome);
                Disposition::Reject { requeue: true }
            }
        }
    }

    /// 去重后转发内容
    ///
    /// 先记录再发布。记录是原子的“不存在则写入”，并发处理同一内容的投递中
    /// 只有写入成功的那一条会发布；发布失败（包括代理否认确认）时删除刚写入的记录，
    /// 保证重新投递不会被误判为重复
    async fn forward(&self, request: &CrawlRequest, body: Bytes, content_type: &str) -> Disposition {
        let key = DedupKey::new(&self.options.key_prefix, &request.url, &body);

        match self.dedup.exists(&key).await {
            Ok(true) => {
                debug!(key = %key, "Content unchanged since last forward, skipping");
                counter!(DEDUP_HITS_TOTAL).increment(1);
                return Disposition::Ack;
            }
            Ok(false) => {}
            Err(e) => {
                counter!(DEDUP_ERRORS_TOTAL).increment(1);
                match self.options.failure_policy {
                    DedupFailurePolicy::Requeue => {
                        warn!("Dedup lookup failed, requeueing: {}", e);
                        return Disposition::Reject { requeue: true };
                    }
                    DedupFailurePolicy::Forward => {
                        warn!("Dedup lookup failed, forwarding anyway: {}", e);
                    }
                }
            }
        }

        let recorded = match self.dedup.add(&key, self.options.ttl).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(key = %key, "Content recorded by a concurrent delivery, skipping");
                counter!(DEDUP_HITS_TOTAL).increment(1);
                return Disposition::Ack;
            }
            Err(e) => {
                counter!(DEDUP_ERRORS_TOTAL).increment(1);
                match self.options.failure_policy {
                    DedupFailurePolicy::Requeue => {
                        warn!("Dedup record failed, requeueing: {}", e);
                        return Disposition::Reject { requeue: true };
                    }
                    DedupFailurePolicy::Forward => {
                        warn!("Dedup record failed, forwarding anyway: {}", e);
                        false
                    }
                }
            }
        };

        let bytes = body.len();
        let message = OutboundMessage::forward(&self.options.publish, content_type, body)
            .with_source_url(request.url.as_str());

        match self.publisher.publish(message).await {
            Ok(()) => {
                counter!(PUBLISHED_TOTAL).increment(1);
                debug!(bytes, content_type, "Content forwarded");
                Disposition::Ack
            }
            Err(e) => {
                error!("Failed to forward content: {}", e);
                if recorded {
                    if let Err(e) = self.dedup.remove(&key).await {
                        counter!(DEDUP_ERRORS_TOTAL).increment(1);
                        error!(key = %key, "Failed to roll back dedup record: {}", e);
                    }
                }
                Disposition::Reject { requeue: true }
            }
        }
    }

    /// 处理重定向
    ///
    /// 重定向本身总是被确认；只有重新发布目标失败时才重新入队原消息
    async fn handle_redirect(&self, request: &CrawlRequest, location: Option<&str>) -> Disposition {
        info!(location = location.unwrap_or(""), "HTTP redirect encountered");

        if self.options.redirect_policy == RedirectPolicy::Drop {
            return Disposition::Ack;
        }

        let Some(target) = location.and_then(|location| resolve_location(&request.url, location))
        else {
            warn!("Redirect has no usable Location header, dropping");
            return Disposition::Ack;
        };

        if !self.engine.in_scope(&target) {
            info!(target = %target, "Redirect target is outside the root host, dropping");
            return Disposition::Ack;
        }

        let message = OutboundMessage::new(
            self.options.inbound_exchange.clone(),
            self.options.inbound_routing_key.clone(),
            REDIRECT_TARGET_CONTENT_TYPE,
            target.as_str().to_string(),
        );

        match self.publisher.publish(message).await {
            Ok(()) => {
                debug!(target = %target, "Redirect target enqueued");
                Disposition::Ack
            }
            Err(e) => {
                error!(target = %target, "Failed to enqueue redirect target: {}", e);
                Disposition::Reject { requeue: true }
            }
        }
    }
}

/// 将 `Location` 头解析为绝对URL，支持相对路径
fn resolve_location(base: &Url, location: &str) -> Option<Url> {
    base.join(location.trim()).ok()
}

#[cfg(test)]
#[path = "crawl_worker_test.rs"]
mod tests;
