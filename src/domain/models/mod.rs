// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义实体目录、提及记录、采集任务、搜索凭证和单实体处理结果
pub mod credential;
pub mod entity_outcome;
pub mod mention;
pub mod scrape_job;
pub mod tracked_entity;
