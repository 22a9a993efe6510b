// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 解析并验证根URL
///
/// 根URL必须是带主机名的 http/https 地址
pub fn parse_root_url(url_str: &str) -> anyhow::Result<Url> {
    let url = Url::parse(url_str)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow::anyhow!(
            "Unsupported scheme for root URL: {}",
            url.scheme()
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(anyhow::anyhow!("Missing host"));
    }

    Ok(url)
}

/// URL的授权部分（主机，以及显式指定的端口）
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// 判断URL是否属于根主机
///
/// 按授权部分做前缀匹配，例如根主机 `www.gov.uk` 允许 `www.gov.uk`
/// 和 `www.gov.uk:8080`，拒绝 `evil.example`。
pub fn is_local_host(root: &Url, candidate: &Url) -> bool {
    let root_authority = authority(root);
    !root_authority.is_empty() && authority(candidate).starts_with(&root_authority)
}
