// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use reqwest::StatusCode;

/// 需要重试的状态码：429 以及 500-599
pub const RETRY_STATUS_CODES: [u16; 101] = retry_status_codes();

/// 视为重定向的状态码
pub const REDIRECT_STATUS_CODES: [StatusCode; 4] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
];

const fn retry_status_codes() -> [u16; 101] {
    let mut codes = [0u16; 101];
    codes[0] = 429;
    let mut i = 1;
    while i < codes.len() {
        codes[i] = 499 + i as u16;
        i += 1;
    }
    codes
}

/// 状态码分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 429/5xx
    Retryable,
    /// 404
    NotFound,
    /// 301/302/303/307
    Redirect,
    /// 读取响应体并作为成功结果返回
    Fetch,
}

/// 对HTTP状态码分类
///
/// 按优先级依次判断：可重试、未找到、重定向，其余状态（包括200）都读取响应体。
/// 纯函数，无副作用。
pub fn classify_status(status: StatusCode) -> StatusClass {
    let code = status.as_u16();
    if RETRY_STATUS_CODES.contains(&code) {
        StatusClass::Retryable
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else if REDIRECT_STATUS_CODES.contains(&status) {
        StatusClass::Redirect
    } else {
        StatusClass::Fetch
    }
}
