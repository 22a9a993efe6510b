// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 健康严重级别
///
/// 有序：`Ok < Warning < Critical`，聚合时取最大值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 正常
    #[default]
    Ok,
    /// 仍可用，但部分依赖异常
    Warning,
    /// 严重故障
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// 单项检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// 严重级别
    pub status: Severity,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn ok() -> Self {
        Self {
            status: Severity::Ok,
            message: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: Severity::Warning,
            message: Some(message.into()),
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            status: Severity::Critical,
            message: Some(message.into()),
        }
    }
}

/// 聚合健康状态
///
/// 每次请求重新计算，不做持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateStatus {
    /// 所有检查中的最高严重级别
    pub status: Severity,
    /// 检查名称到单项结果的映射
    pub checks: BTreeMap<String, CheckResult>,
}

impl AggregateStatus {
    /// 根据单项结果计算聚合状态
    pub fn from_checks(checks: BTreeMap<String, CheckResult>) -> Self {
        let status = checks
            .values()
            .map(|check| check.status)
            .max()
            .unwrap_or_default();
        Self { status, checks }
    }
}
