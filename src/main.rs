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

use crawlrs_worker::config::settings::{DedupBackend, Settings};
use crawlrs_worker::domain::repositories::dedup_repository::DedupRepository;
use crawlrs_worker::domain::services::health_service::{HealthChecker, HealthService};
use crawlrs_worker::engines::reqwest_engine::ReqwestEngine;
use crawlrs_worker::infrastructure::cache::memory_dedup::MemoryDedupStore;
use crawlrs_worker::infrastructure::cache::redis_client::RedisClient;
use crawlrs_worker::infrastructure::health_checks::{DedupHealthCheck, QueueHealthCheck};
use crawlrs_worker::infrastructure::metrics;
use crawlrs_worker::presentation::routes;
use crawlrs_worker::queue::amqp_connection::QueueConnection;
use crawlrs_worker::queue::traits::QueueTopology;
use crawlrs_worker::utils::telemetry;
use crawlrs_worker::workers::crawl_worker::{CrawlWorker, CrawlWorkerOptions};
use crawlrs_worker::workers::manager::WorkerManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动工作器。
/// 队列连接意外丢失时返回错误，进程以非零状态退出。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(settings.log.json);
    info!("Starting crawlrs-worker {}...", env!("CARGO_PKG_VERSION"));

    if settings.metrics.enabled {
        metrics::init_metrics(&settings.metrics.listen_addr);
    }

    // 3. Crawl engine
    let engine = Arc::new(ReqwestEngine::new(&settings.crawler)?);
    info!(root_url = %engine.root_url(), user_agent = engine.user_agent(), "Crawl engine initialized");

    // 4. Dedup store
    let dedup: Arc<dyn DedupRepository> = match settings.dedup.backend {
        DedupBackend::Redis => Arc::new(RedisClient::new(&settings.dedup.redis_url).await?),
        DedupBackend::Memory => Arc::new(MemoryDedupStore::new()),
    };
    info!(backend = ?settings.dedup.backend, "Dedup store initialized");

    // 5. Queue transport and topology
    let connection = Arc::new(QueueConnection::connect(&settings.amqp).await?);
    connection
        .declare_topology(&QueueTopology::from(&settings.amqp))
        .await?;
    connection
        .declare_exchange(&settings.publish.exchange, &settings.publish.exchange_type)
        .await?;

    // 6. Health endpoint
    let checkers: Vec<Arc<dyn HealthChecker>> = vec![
        Arc::new(QueueHealthCheck::new(
            connection.clone(),
            settings.amqp.queue.clone(),
        )),
        Arc::new(DedupHealthCheck::new(dedup.clone())),
    ];
    let health_service =
        Arc::new(HealthService::new(checkers).with_timeout(settings.health.check_timeout()));

    let addr = format!("{}:{}", settings.health.host, settings.health.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Health endpoint listening on {}", addr);
    let app = routes::routes(health_service);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Health server stopped: {}", e);
        }
    });

    // 7. Worker
    let worker = Arc::new(CrawlWorker::new(
        engine,
        dedup,
        connection.clone(),
        CrawlWorkerOptions::from_settings(&settings),
    ));
    let manager = WorkerManager::new(
        worker,
        connection,
        settings.amqp.queue.clone(),
        usize::from(settings.amqp.prefetch_count),
    );

    manager.run().await?;
    info!("crawlrs-worker stopped");
    Ok(())
}
