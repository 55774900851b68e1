// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供单实体采集 worker 和有界并发的编排器
pub mod entity_worker;
pub mod orchestrator;
pub mod worker;

pub use worker::EntityProcessor;
