// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::models::crawl::DedupKey;
use crate::domain::repositories::dedup_repository::{DedupError, DedupRepository};

/// Redis客户端
///
/// 基于多路复用连接的去重存储实现，连接可安全地在并发任务间克隆共享
#[derive(Clone)]
pub struct RedisClient {
    /// 多路复用连接
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(DedupError)` - URL无效或无法建立连接
    pub async fn new(redis_url: &str) -> Result<Self, DedupError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self { connection })
    }
}

/// Redis的 `PX` 过期时间以毫秒为单位且必须为正数
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl DedupRepository for RedisClient {
    async fn exists(&self, key: &DedupKey) -> Result<bool, DedupError> {
        let mut con = self.connection.clone();
        let exists: bool = con.exists(key.as_str()).await?;
        Ok(exists)
    }

    async fn add(&self, key: &DedupKey, ttl: Duration) -> Result<bool, DedupError> {
        let mut con = self.connection.clone();
        // SET NX replies OK when the key was written and nil when it already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key.as_str())
            .arg("")
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut con)
            .await?;
        Ok(reply.is_some())
    }

    async fn remove(&self, key: &DedupKey) -> Result<(), DedupError> {
        let mut con = self.connection.clone();
        con.del::<_, ()>(key.as_str()).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<String, DedupError> {
        let mut con = self.connection.clone();
        let reply: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(reply)
    }
}
