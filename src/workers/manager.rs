// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::queue::amqp_connection::QueueConnection;
use crate::utils::errors::WorkerError;
use crate::workers::crawl_worker::CrawlWorker;

/// 工作管理器
///
/// 托管爬取工作器任务，把队列连接的丢失信号转换为致命错误。
/// 进程不在内部重连，由外部监管者负责重启。
pub struct WorkerManager {
    worker: Arc<CrawlWorker>,
    connection: Arc<QueueConnection>,
    queue: String,
    concurrency: usize,
}

impl WorkerManager {
    pub fn new(
        worker: Arc<CrawlWorker>,
        connection: Arc<QueueConnection>,
        queue: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            worker,
            connection,
            queue: queue.into(),
            concurrency,
        }
    }

    /// 运行工作器直到收到关闭信号或连接丢失
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 收到Ctrl-C，连接已显式关闭
    /// * `Err(WorkerError::TransportLost)` - 连接意外丢失
    /// * `Err(WorkerError)` - 无法开始消费或消费者流意外结束
    pub async fn run(&self) -> Result<(), WorkerError> {
        let consumer = self.connection.consume(&self.queue).await?;
        let lost = self.connection.subscribe_lost();

        let worker = self.worker.clone();
        let concurrency = self.concurrency;
        let work = async move { worker.run(consumer, concurrency).await };

        let result = supervise(work, lost, wait_for_ctrl_c()).await;
        if result.is_ok() {
            self.connection.close().await?;
        }
        result
    }
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await
        }
    }
}

/// 等待连接丢失信号，返回丢失原因
pub async fn wait_for_loss(lost: &mut watch::Receiver<Option<String>>) -> String {
    loop {
        if let Some(reason) = lost.borrow_and_update().clone() {
            return reason;
        }
        if lost.changed().await.is_err() {
            return "connection supervisor dropped".to_string();
        }
    }
}

/// 在工作任务、连接丢失和关闭信号之间竞争
///
/// 工作任务在独立的tokio任务中运行，返回前总会被中止。
/// 在途投递不做排空，未确认的消息由代理重新投递。
///
/// # 参数
///
/// * `work` - 工作器的消费循环
/// * `lost` - 连接丢失信号
/// * `shutdown` - 关闭信号
pub async fn supervise<W, S>(
    work: W,
    mut lost: watch::Receiver<Option<String>>,
    shutdown: S,
) -> Result<(), WorkerError>
where
    W: Future<Output = ()> + Send + 'static,
    S: Future<Output = ()>,
{
    let mut handle = tokio::spawn(work);

    let result = tokio::select! {
        _ = shutdown => {
            info!("Shutting down crawl worker...");
            Ok(())
        }
        reason = wait_for_loss(&mut lost) => {
            error!("Queue transport lost: {}", reason);
            Err(WorkerError::TransportLost(reason))
        }
        _ = &mut handle => {
            match lost.borrow().clone() {
                Some(reason) => Err(WorkerError::TransportLost(reason)),
                None => Err(WorkerError::Internal("consumer stream ended unexpectedly".to_string())),
            }
        }
    };

    handle.abort();
    result
}
