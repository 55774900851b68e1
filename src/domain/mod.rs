// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：实体目录、提及记录、采集任务等数据结构
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 搜索接口（search）：外部搜索服务的抽象
/// - 服务（services）：采集管线的各个组件
///
/// 领域层不依赖任何具体的存储或网络实现。
pub mod models;
pub mod repositories;
pub mod search;
pub mod services;
