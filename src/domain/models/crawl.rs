// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use url::Url;

/// 爬取请求解析错误
#[derive(Error, Debug)]
pub enum CrawlRequestError {
    /// 消息体不是合法的UTF-8
    #[error("Delivery body is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    /// 消息体不是合法的绝对URL
    #[error("Delivery body is not an absolute URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// 爬取请求
///
/// 从队列中取出的一条待爬取URL，连同投递标签一起由工作器独占处理，
/// 从出队到确认/拒绝只会被消费一次，且不会被修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// 目标URL
    pub url: Url,
    /// 传输层投递标签（单调递增）
    pub delivery_tag: u64,
}

impl CrawlRequest {
    /// 创建新的爬取请求
    pub fn new(url: Url, delivery_tag: u64) -> Self {
        Self { url, delivery_tag }
    }

    /// 从投递消息体解析爬取请求
    ///
    /// 消息体为UTF-8编码的URL文本，首尾空白会被忽略。
    ///
    /// # 参数
    ///
    /// * `delivery_tag` - 投递标签
    /// * `body` - 消息体
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlRequest)` - 解析成功
    /// * `Err(CrawlRequestError)` - 消息体不是合法的URL
    pub fn from_delivery(delivery_tag: u64, body: &[u8]) -> Result<Self, CrawlRequestError> {
        let text = std::str::from_utf8(body)?;
        let url = Url::parse(text.trim())?;
        Ok(Self::new(url, delivery_tag))
    }
}

/// 爬取结果
///
/// 爬取客户端对单个请求的分类结果。只有 `Success` 携带响应体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// 抓取成功
    Success {
        /// 完整响应体
        body: Bytes,
        /// 响应内容类型
        content_type: String,
    },
    /// URL不属于配置的根主机，未发起任何请求
    NonLocalHost,
    /// 429 或 5xx，应稍后重试
    Retryable {
        /// HTTP状态码
        status: u16,
    },
    /// 404
    NotFound,
    /// 301/302/303/307
    Redirect {
        /// `Location` 响应头（如果存在）
        location: Option<String>,
    },
    /// 网络层失败（DNS、连接、超时、读取响应体）
    TransportError {
        /// 失败原因
        cause: String,
    },
}

impl CrawlOutcome {
    /// 结果标签，用于日志和指标
    pub fn label(&self) -> &'static str {
        match self {
            CrawlOutcome::Success { .. } => "success",
            CrawlOutcome::NonLocalHost => "non_local_host",
            CrawlOutcome::Retryable { .. } => "retryable",
            CrawlOutcome::NotFound => "not_found",
            CrawlOutcome::Redirect { .. } => "redirect",
            CrawlOutcome::TransportError { .. } => "transport_error",
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlOutcome::Success { body, .. } => write!(f, "success ({} bytes)", body.len()),
            CrawlOutcome::NonLocalHost => {
                write!(f, "cannot crawl URLs that don't match the root host")
            }
            CrawlOutcome::Retryable { status } => {
                write!(f, "retry request: HTTP {} returned", status)
            }
            CrawlOutcome::NotFound => write!(f, "404 not found"),
            CrawlOutcome::Redirect { location } => match location {
                Some(location) => write!(f, "HTTP redirect encountered to {}", location),
                None => write!(f, "HTTP redirect encountered"),
            },
            CrawlOutcome::TransportError { cause } => write!(f, "transport error: {}", cause),
        }
    }
}

/// 去重键
///
/// 由URL和内容哈希组成的确定性指纹：相同URL下的相同内容总是生成相同的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    /// 根据URL和内容计算去重键
    ///
    /// # 参数
    ///
    /// * `prefix` - 键命名空间前缀
    /// * `url` - 内容所在URL
    /// * `body` - 内容
    pub fn new(prefix: &str, url: &Url, body: &[u8]) -> Self {
        let digest = Sha256::digest(body);
        Self(format!("{}{}:{}", prefix, hex::encode(digest), url))
    }

    /// 键的字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DedupKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 投递处置方式
///
/// 每条投递必须且只能被确认或拒绝一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 确认
    Ack,
    /// 拒绝，`requeue` 表示是否要求代理重新投递
    Reject { requeue: bool },
}

impl Disposition {
    /// 处置标签，用于日志和指标
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Ack => "ack",
            Disposition::Reject { requeue: true } => "requeue",
            Disposition::Reject { requeue: false } => "reject",
        }
    }
}
