// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含工作器的核心业务逻辑，包括：
/// - 领域模型（models）：爬取请求、结果分类和健康状态
/// - 仓库接口（repositories）：去重存储抽象接口
/// - 服务（services）：健康聚合等领域服务
///
/// 领域层不依赖于任何具体的消息代理或存储实现。
pub mod models;
pub mod repositories;
pub mod services;
