// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含爬取请求、结果分类、去重键和健康状态等核心模型，以及仓库接口和健康聚合服务
pub mod domain;

/// 引擎模块
///
/// 实现限定根主机的HTTP爬取引擎和状态码分类
pub mod engines;

/// 基础设施模块
///
/// 提供去重存储、健康检查和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 提供健康检查HTTP端点
pub mod presentation;

/// 队列模块
///
/// 基于AMQP的消息消费、转发和确认
pub mod queue;

/// 工具模块
///
/// 提供错误类型和日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现爬取、分类、去重、转发的工作器循环
pub mod workers;
