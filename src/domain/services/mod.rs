// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含采集管线的核心业务逻辑：
/// - 凭证池（credential_pool）：多凭证轮询与配额计数
/// - 搜索调度（query_dispatcher）：分页、重试与凭证切换
/// - 抓取提取（fetch_extractor）：页面抓取、解码与正文清洗
/// - 去重写入（dedup_writer）：批量写入提及记录并统计重复
/// - 任务跟踪（job_tracker）：采集任务的状态推进与持久化
pub mod credential_pool;
pub mod dedup_writer;
pub mod fetch_extractor;
pub mod job_tracker;
pub mod query_dispatcher;
