// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取引擎模块
///
/// 页面抓取抽象与基于 reqwest 的实现
pub mod reqwest_engine;
pub mod traits;
