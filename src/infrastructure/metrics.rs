// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 爬取结果计数，标签 `outcome`
pub const OUTCOMES_TOTAL: &str = "crawler_outcomes_total";
/// 消息处置计数，标签 `disposition`
pub const DISPOSITIONS_TOTAL: &str = "crawler_dispositions_total";
/// 转发成功计数
pub const PUBLISHED_TOTAL: &str = "crawler_published_total";
/// 去重命中计数
pub const DEDUP_HITS_TOTAL: &str = "crawler_dedup_hits_total";
/// 去重存储错误计数
pub const DEDUP_ERRORS_TOTAL: &str = "crawler_dedup_errors_total";
/// 单次爬取耗时
pub const CRAWL_DURATION_SECONDS: &str = "crawler_crawl_duration_seconds";

/// 初始化Prometheus指标导出
///
/// 安装失败时只记录警告，工作器继续运行
///
/// # 参数
///
/// * `listen_addr` - 导出监听地址
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address '{}': {}", listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!(OUTCOMES_TOTAL, "Total number of crawl outcomes by class");
    describe_counter!(
        DISPOSITIONS_TOTAL,
        "Total number of deliveries settled by disposition"
    );
    describe_counter!(PUBLISHED_TOTAL, "Total number of documents forwarded");
    describe_counter!(
        DEDUP_HITS_TOTAL,
        "Total number of documents skipped as recently forwarded"
    );
    describe_counter!(DEDUP_ERRORS_TOTAL, "Total number of dedup store failures");
    describe_histogram!(
        CRAWL_DURATION_SECONDS,
        "Duration of HTTP crawls in seconds"
    );
}
