// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl::DedupKey;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 去重存储错误类型
#[derive(Error, Debug)]
pub enum DedupError {
    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    /// 其他后端错误
    #[error("Dedup backend error: {0}")]
    Backend(String),
}

/// 去重存储特质
///
/// 回答“最近是否已经转发过这份内容”。记录的过期由存储自身负责，
/// 工作器从不主动淘汰条目。并发工作器之间的原子性由存储保证。
#[async_trait]
pub trait DedupRepository: Send + Sync {
    /// 检查键是否存在
    async fn exists(&self, key: &DedupKey) -> Result<bool, DedupError>;

    /// 键不存在时记录键并设置过期时间
    ///
    /// 检查与写入是一次原子操作。返回 `true` 表示本次调用新写入了记录；
    /// 返回 `false` 表示键已存在（例如另一个并发投递先写入），此时不做任何修改。
    /// 幂等：重复添加同一个键不会报错。
    async fn add(&self, key: &DedupKey, ttl: Duration) -> Result<bool, DedupError>;

    /// 删除键
    ///
    /// 仅在记录后转发失败时用于回滚。
    async fn remove(&self, key: &DedupKey) -> Result<(), DedupError>;

    /// 存活探测，正常时返回 `PONG`
    async fn ping(&self) -> Result<String, DedupError>;
}
