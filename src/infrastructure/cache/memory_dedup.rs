// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::models::crawl::DedupKey;
use crate::domain::repositories::dedup_repository::{DedupError, DedupRepository};

/// 默认清扫间隔
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// 进程内去重存储
///
/// 读取时惰性判断过期；写入路径上每隔 `sweep_interval` 清扫一次全部过期条目，
/// 内容变化后不再被查询的旧键也会被回收。只适用于单实例部署和测试，
/// 多个工作器实例之间不共享记录。
pub struct MemoryDedupStore {
    entries: DashMap<String, Instant>,
    sweep_interval: Duration,
    started_at: Instant,
    /// 下一次清扫时间，相对 `started_at` 的毫秒数
    next_sweep_ms: AtomicU64,
}

impl Default for MemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDedupStore {
    /// 创建空的去重存储
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// 使用指定清扫间隔创建去重存储
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            sweep_interval,
            started_at: Instant::now(),
            next_sweep_ms: AtomicU64::new(millis(sweep_interval)),
        }
    }

    /// 未过期的条目数量
    pub fn len(&self) -> usize {
        self.sweep(Instant::now());
        self.entries.len()
    }

    /// 是否没有未过期的条目
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "Evicted expired dedup entries");
        }
    }

    /// 到达清扫时间时清扫过期条目，同一时刻只有一个调用者执行清扫
    fn maybe_sweep(&self, now: Instant) {
        let elapsed = millis(now.duration_since(self.started_at));
        let due = self.next_sweep_ms.load(Ordering::Acquire);
        if elapsed < due {
            return;
        }
        let next = elapsed.saturating_add(millis(self.sweep_interval));
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.sweep(now);
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl DedupRepository for MemoryDedupStore {
    async fn exists(&self, key: &DedupKey) -> Result<bool, DedupError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key.as_str())
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false);

        if !live {
            self.entries
                .remove_if(key.as_str(), |_, expires_at| *expires_at <= now);
        }
        Ok(live)
    }

    async fn add(&self, key: &DedupKey, ttl: Duration) -> Result<bool, DedupError> {
        let now = Instant::now();
        self.maybe_sweep(now);

        let added = match self.entries.entry(key.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    false
                } else {
                    entry.insert(now + ttl);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now + ttl);
                true
            }
        };
        Ok(added)
    }

    async fn remove(&self, key: &DedupKey) -> Result<(), DedupError> {
        self.entries.remove(key.as_str());
        Ok(())
    }

    async fn ping(&self) -> Result<String, DedupError> {
        Ok("PONG".to_string())
    }
}
