// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义实体目录、提及记录和采集任务的数据访问接口
pub mod entity_repository;
pub mod mention_repository;
pub mod scrape_job_repository;
