// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 被追踪的实体
///
/// 由外部目录流程维护；采集管线只读取它，唯一的写操作是记录 `last_scraped`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// 实体 ID
    pub id: i64,
    /// 展示名称，同时作为搜索关键词
    pub display_name: String,
    /// 语言/地区提示，例如 `zh-CN`
    pub locale_hint: Option<String>,
    /// 目录状态
    pub status: EntityStatus,
    /// 最近一次被采集的时间
    pub last_scraped: Option<DateTime<FixedOffset>>,
}

/// 实体目录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// 参与批量采集
    #[default]
    Active,
    /// 暂停采集
    Inactive,
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityStatus::Active => write!(f, "active"),
            EntityStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for EntityStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EntityStatus::Active),
            "inactive" => Ok(EntityStatus::Inactive),
            _ => Err(()),
        }
    }
}

impl TrackedEntity {
    /// 创建处于活跃状态的实体
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            locale_hint: None,
            status: EntityStatus::Active,
            last_scraped: None,
        }
    }

    /// 设置语言提示
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale_hint = Some(locale.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }
}
