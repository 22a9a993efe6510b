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

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::models::crawl::CrawlOutcome;

/// 引擎错误类型
///
/// 只在构建引擎时出现；单次爬取的失败以 `CrawlOutcome` 数据的形式返回。
#[derive(Error, Debug)]
pub enum EngineError {
    /// HTTP客户端构建失败
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    /// 根URL无效
    #[error("Invalid root URL: {0}")]
    InvalidRootUrl(String),
}

/// 爬取引擎特质
#[async_trait]
pub trait CrawlEngine: Send + Sync {
    /// 爬取单个URL并返回分类后的结果
    ///
    /// 不在内部重试，重试策略由工作器通过消息重新投递实现。
    async fn crawl(&self, url: &Url) -> CrawlOutcome;

    /// URL是否属于该引擎被授权爬取的根主机
    fn in_scope(&self, url: &Url) -> bool;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
