// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了工作器的核心数据结构，包括：
/// - 爬取（crawl）：爬取请求、爬取结果、去重键和投递处置
/// - 健康（health）：严重级别、单项检查结果和聚合状态
pub mod crawl;
pub mod health;
