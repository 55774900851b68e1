// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CredentialSettings;
use crate::domain::models::credential::{Credential, CredentialState};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::warn;

/// 所有凭证配额均已耗尽
///
/// 对当前调用是终止性的，不应重试
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("all search credentials have exhausted their quota")]
pub struct QuotaExhausted;

struct Slot {
    credential: Credential,
    used: AtomicU64,
}

/// 搜索凭证池
///
/// 以轮询方式分配凭证并跟踪每个凭证的配额使用量。
/// 计数器全部是原子变量，多个 worker 并发调用时不会丢失更新。
/// 配额重置只能由外部调度显式触发。
pub struct CredentialPool {
    slots: Vec<Slot>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// 创建凭证池
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            slots: credentials
                .into_iter()
                .map(|credential| Slot {
                    credential,
                    used: AtomicU64::new(0),
                })
                .collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// 根据配置创建凭证池，未命名的凭证按位置编号
    pub fn from_settings(settings: &[CredentialSettings]) -> Self {
        let credentials = settings
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Credential::new(
                    c.id.clone().unwrap_or_else(|| format!("credential-{}", i + 1)),
                    c.api_key.clone(),
                    c.engine_id.clone(),
                    c.quota_limit,
                )
            })
            .collect();
        Self::new(credentials)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 按轮询顺序获取一个尚有配额的凭证，并预留一次调用的配额
    ///
    /// # 返回值
    ///
    /// * `Ok(Credential)` - 已预留配额的凭证
    /// * `Err(QuotaExhausted)` - 全部凭证都已耗尽
    pub fn acquire(&self) -> Result<Credential, QuotaExhausted> {
        self.acquire_excluding(&HashSet::new())
    }

    /// 与 [`acquire`](Self::acquire) 相同，但跳过 `excluded` 中的凭证 ID
    pub fn acquire_excluding(&self, excluded: &HashSet<String>) -> Result<Credential, QuotaExhausted> {
        let n = self.slots.len();
        if n == 0 {
            return Err(QuotaExhausted);
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        for step in 0..n {
            let idx = start.wrapping_add(step) % n;
            let slot = &self.slots[idx];
            if excluded.contains(&slot.credential.id) {
                continue;
            }

            let limit = slot.credential.quota_limit;
            let reserved = slot
                .used
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                    (used < limit).then_some(used + 1)
                })
                .is_ok();

            if reserved {
                if step > 0 {
                    // 跳过了耗尽的凭证，下一次从选中凭证之后开始
                    let _ = self.cursor.compare_exchange(
                        start.wrapping_add(1),
                        idx.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    );
                }
                return Ok(slot.credential.clone());
            }
        }

        Err(QuotaExhausted)
    }

    /// 记录一次在 `acquire` 之外发生的调用
    pub fn record_use(&self, credential: &Credential) {
        match self.slots.iter().find(|s| s.credential.id == credential.id) {
            Some(slot) => {
                slot.used.fetch_add(1, Ordering::AcqRel);
            }
            None => warn!(credential_id = %credential.id, "record_use for unknown credential"),
        }
    }

    /// 清零所有计数器
    pub fn reset(&self) {
        for slot in &self.slots {
            slot.used.store(0, Ordering::Release);
        }
    }

    /// 是否至少有一个凭证还有配额
    pub fn has_available(&self) -> bool {
        self.slots
            .iter()
            .any(|s| s.used.load(Ordering::Acquire) < s.credential.quota_limit)
    }

    /// 所有凭证
    pub fn credentials(&self) -> Vec<Credential> {
        self.slots.iter().map(|s| s.credential.clone()).collect()
    }

    /// 当前配额使用情况
    pub fn snapshot(&self) -> Vec<CredentialState> {
        self.slots
            .iter()
            .map(|s| CredentialState {
                credential_id: s.credential.id.clone(),
                quota_limit: s.credential.quota_limit,
                used_today: s.used.load(Ordering::Acquire),
            })
            .collect()
    }
}
