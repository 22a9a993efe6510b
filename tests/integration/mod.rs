// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod crawl_pipeline_test;
mod health_check;
mod helpers;
mod queue_connection_test;
