// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 使用SeaORM定义实体目录、提及记录和采集任务三张表的映射
pub mod mention;
pub mod scrape_job;
pub mod tracked_entity;
