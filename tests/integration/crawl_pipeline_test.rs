// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crawlrs_worker::config::settings::RedirectPolicy;
use crawlrs_worker::domain::models::crawl::Disposition;
use crawlrs_worker::engines::reqwest_engine::ReqwestEngine;
use crawlrs_worker::infrastructure::cache::memory_dedup::MemoryDedupStore;
use crawlrs_worker::workers::crawl_worker::{CrawlWorker, CrawlWorkerOptions};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{crawler_settings, default_settings, RecordingPublisher};

struct Pipeline {
    worker: CrawlWorker,
    publisher: Arc<RecordingPublisher>,
}

fn pipeline(server: &MockServer, redirect_policy: RedirectPolicy) -> Pipeline {
    pipeline_for(&server.uri(), redirect_policy)
}

fn pipeline_for(root_url: &str, redirect_policy: RedirectPolicy) -> Pipeline {
    let mut settings = default_settings();
    settings.worker.redirect_policy = redirect_policy;

    let engine = Arc::new(ReqwestEngine::new(&crawler_settings(root_url)).unwrap());
    let publisher = Arc::new(RecordingPublisher::default());
    let worker = CrawlWorker::new(
        engine,
        Arc::new(MemoryDedupStore::new()),
        publisher.clone(),
        CrawlWorkerOptions::from_settings(&settings),
    );

    Pipeline { worker, publisher }
}

/// 新内容转发一次，相同内容的重新投递不再转发
#[tokio::test]
async fn new_content_is_forwarded_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/html"))
        .expect(2)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, RedirectPolicy::Drop);
    let url = format!("{}/foo", server.uri());

    assert_eq!(
        pipeline.worker.process(1, url.as_bytes()).await,
        Disposition::Ack
    );
    let published = pipeline.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(&published[0].body[..], b"hello");
    assert_eq!(published[0].exchange, "crawler_content_exchange");
    assert_eq!(published[0].source_url.as_deref(), Some(url.as_str()));

    assert_eq!(
        pipeline.worker.process(2, url.as_bytes()).await,
        Disposition::Ack
    );
    assert_eq!(pipeline.publisher.published().len(), 1);
}

/// 非本站URL被拒绝且不重新入队，不发起HTTP请求
#[tokio::test]
async fn off_site_url_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, RedirectPolicy::Drop);

    assert_eq!(
        pipeline.worker.process(1, b"https://evil.example/foo").await,
        Disposition::Reject { requeue: false }
    );
    assert!(pipeline.publisher.published().is_empty());
}

/// 429和5xx重新入队，404确认
#[tokio::test]
async fn status_codes_map_to_dispositions() {
    let server = MockServer::start().await;
    Mock::given(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, RedirectPolicy::Drop);
    let url = |p: &str| format!("{}{}", server.uri(), p);

    assert_eq!(
        pipeline.worker.process(1, url("/busy").as_bytes()).await,
        Disposition::Reject { requeue: true }
    );
    assert_eq!(
        pipeline.worker.process(2, url("/broken").as_bytes()).await,
        Disposition::Reject { requeue: true }
    );
    assert_eq!(
        pipeline.worker.process(3, url("/missing").as_bytes()).await,
        Disposition::Ack
    );
    assert!(pipeline.publisher.published().is_empty());
}

/// 配置为重新入队时，重定向目标被发布到入站交换机
#[tokio::test]
async fn redirect_target_is_enqueued() {
    let server = MockServer::start().await;
    Mock::given(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, RedirectPolicy::EnqueueTarget);
    let url = format!("{}/old", server.uri());

    assert_eq!(
        pipeline.worker.process(1, url.as_bytes()).await,
        Disposition::Ack
    );

    let published = pipeline.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].exchange, "crawler_exchange");
    assert_eq!(
        published[0].body,
        format!("{}/new", server.uri()).into_bytes()
    );
}

/// 连接失败重新入队
#[tokio::test]
async fn unreachable_origin_is_requeued() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let root = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let pipeline = pipeline_for(&root, RedirectPolicy::Drop);
    let url = format!("{}/foo", root);

    assert_eq!(
        pipeline.worker.process(1, url.as_bytes()).await,
        Disposition::Reject { requeue: true }
    );
    assert!(pipeline.publisher.published().is_empty());
}
