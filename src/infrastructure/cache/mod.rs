// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供去重存储的实现
/// 包括Redis客户端和进程内存储
pub mod memory_dedup;
pub mod redis_client;
