// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供AMQP连接、拓扑声明、消费、发布和确认功能
pub mod amqp_connection;
pub mod traits;
