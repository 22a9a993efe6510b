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

use crate::config::settings::CrawlerSettings;
use crate::domain::models::crawl::CrawlOutcome;
use crate::engines::classifier::{classify_status, StatusClass};
use crate::engines::traits::{CrawlEngine, EngineError};
use crate::engines::validators;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// 响应缺少内容类型时使用的默认值
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 构建User-Agent
///
/// 包含工作器版本和主机名，便于源站排查问题
pub fn user_agent(product: &str, version: &str, hostname: &str) -> String {
    format!("{}/{} on host '{}'", product, version, hostname)
}

/// 本机主机名，获取失败时返回空字符串
pub fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 抓取引擎
///
/// 基于reqwest实现的限定根主机的HTTP爬取引擎。不自动跟随重定向，
/// 重定向作为 `Redirect` 结果返回。
pub struct ReqwestEngine {
    client: reqwest::Client,
    root_url: Url,
    user_agent: String,
}

impl ReqwestEngine {
    /// 创建新的爬取引擎
    ///
    /// # 参数
    ///
    /// * `settings` - 爬虫配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(EngineError)` - 根URL无效或HTTP客户端构建失败
    pub fn new(settings: &CrawlerSettings) -> Result<Self, EngineError> {
        let root_url = validators::parse_root_url(&settings.root_url)
            .map_err(|e| EngineError::InvalidRootUrl(format!("{}: {}", settings.root_url, e)))?;
        let user_agent = user_agent(
            &settings.user_agent,
            env!("CARGO_PKG_VERSION"),
            &local_hostname(),
        );

        let client = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .redirect(Policy::none())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            root_url,
            user_agent,
        })
    }

    /// 根URL
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// 请求时发送的User-Agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl CrawlEngine for ReqwestEngine {
    /// 执行HTTP爬取
    ///
    /// 先校验主机范围，不通过时不发起任何请求。响应在每条返回路径上都会被释放。
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// 分类后的爬取结果
    async fn crawl(&self, url: &Url) -> CrawlOutcome {
        if !self.in_scope(url) {
            return CrawlOutcome::NonLocalHost;
        }

        let start = Instant::now();
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                return CrawlOutcome::TransportError {
                    cause: e.to_string(),
                }
            }
        };

        let status = response.status();
        debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        match classify_status(status) {
            StatusClass::Retryable => CrawlOutcome::Retryable {
                status: status.as_u16(),
            },
            StatusClass::NotFound => CrawlOutcome::NotFound,
            StatusClass::Redirect => CrawlOutcome::Redirect {
                location: response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            },
            StatusClass::Fetch => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();

                match response.bytes().await {
                    Ok(body) => CrawlOutcome::Success { body, content_type },
                    Err(e) => CrawlOutcome::TransportError {
                        cause: e.to_string(),
                    },
                }
            }
        }
    }

    fn in_scope(&self, url: &Url) -> bool {
        validators::is_local_host(&self.root_url, url)
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
