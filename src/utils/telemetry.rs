// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// 初始化日志订阅器
///
/// `RUST_LOG` 未设置时使用 `info,crawlrs_worker=debug`
///
/// # 参数
///
/// * `json` - 是否输出JSON格式日志
pub fn init_telemetry(json: bool) {
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crawlrs_worker=debug".into()),
        )
        .with(fmt_layer)
        .init();
}
