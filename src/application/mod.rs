// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 负责把领域组件组装为完整的采集运行：预检、编排、任务收尾
pub mod dto;
pub mod usecases;
