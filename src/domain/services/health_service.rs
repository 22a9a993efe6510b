// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::models::health::{AggregateStatus, CheckResult};

/// 默认单项检查超时时间
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// 检查超时时写入的固定信息
pub const TIMED_OUT_MESSAGE: &str = "Check timed out";

/// 健康检查特质
///
/// 每个依赖（消息队列、去重存储等）各自实现一个检查器，
/// 聚合器只依赖此能力而不依赖具体类型。
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// 检查名称
    fn name(&self) -> &str;

    /// 执行一次检查
    async fn check(&self) -> CheckResult;
}

/// 健康聚合服务
///
/// 并发执行所有已注册的检查，每项检查与共享超时赛跑。
/// 超时的检查被强制标记为 `critical`；未完成的探测 future 随超时一起被丢弃，
/// 不会在后台继续占用资源。
pub struct HealthService {
    checkers: Vec<Arc<dyn HealthChecker>>,
    timeout: Duration,
}

impl HealthService {
    /// 使用默认超时创建健康聚合服务
    pub fn new(checkers: Vec<Arc<dyn HealthChecker>>) -> Self {
        Self {
            checkers,
            timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// 设置单项检查超时时间
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 当前超时时间
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 计算聚合健康状态
    ///
    /// * 所有检查为 `ok` 时整体为 `ok`
    /// * 存在 `warning` 且没有 `critical` 时整体为 `warning`
    /// * 存在任一 `critical` 时整体为 `critical`
    ///
    /// 每次调用都是一次全新的并发扇出，不保留任何状态。
    pub async fn status(&self) -> AggregateStatus {
        let timeout = self.timeout;
        let probes = self.checkers.iter().map(|checker| async move {
            let result = match tokio::time::timeout(timeout, checker.check()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(check = checker.name(), "Health check timed out after {:?}", timeout);
                    CheckResult::critical(TIMED_OUT_MESSAGE)
                }
            };
            (checker.name().to_string(), result)
        });

        let checks: BTreeMap<String, CheckResult> = join_all(probes).await.into_iter().collect();
        AggregateStatus::from_checks(checks)
    }
}
