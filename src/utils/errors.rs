// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::queue::traits::QueueError;

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    /// 队列连接意外丢失，进程应当退出并由外部监管者重启
    #[error("传输连接丢失: {0}")]
    TransportLost(String),

    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),

    #[error("内部错误: {0}")]
    Internal(String),
}
