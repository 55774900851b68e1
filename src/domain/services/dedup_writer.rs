// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity_outcome::FailedUrl;
use crate::domain::models::mention::Mention;
use crate::domain::repositories::mention_repository::{InsertOutcome, MentionRepository};
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// 一次刷写的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushStats {
    /// 新写入的行数
    pub inserted: u64,
    /// 已存在（进程内或存储中）而被跳过的行数
    pub duplicates: u64,
    /// 写入失败的行数
    pub failed: u64,
    /// 写入失败的 URL
    pub failed_urls: Vec<FailedUrl>,
}

impl FlushStats {
    /// 合并另一次刷写的统计
    pub fn merge(&mut self, other: FlushStats) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
        self.failed_urls.extend(other.failed_urls);
    }
}

/// 去重写入器
///
/// 在内存中缓冲提及记录并批量写入。进程内重复的 `(entity_id, source_url)`
/// 不会进入缓冲区；存储中已存在的行由唯一约束跳过。批量写入出错时
/// 逐行重试，个别坏行不会拖累整批。
pub struct DedupWriter {
    repo: Arc<dyn MentionRepository>,
    batch_size: usize,
    pending: Vec<Mention>,
    seen: HashSet<(i64, String)>,
    carried: FlushStats,
}

impl DedupWriter {
    pub fn new(repo: Arc<dyn MentionRepository>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            repo,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            seen: HashSet::new(),
            carried: FlushStats::default(),
        }
    }

    /// 缓冲一条记录
    ///
    /// 进程内重复或校验失败的记录不进入缓冲区，计入下一次刷写的统计
    ///
    /// # 返回值
    ///
    /// 缓冲区是否已达到批量大小，需要刷写
    pub fn buffer(&mut self, mention: Mention) -> bool {
        if let Err(err) = mention.validate() {
            warn!(url = %mention.source_url, error = %err, "rejecting invalid mention");
            self.carried.failed += 1;
            self.carried
                .failed_urls
                .push(FailedUrl::new(mention.source_url, err.to_string()));
            return false;
        }

        let key = (mention.entity_id, mention.source_url.clone());
        if !self.seen.insert(key) {
            debug!(url = %mention.source_url, "duplicate mention within run");
            self.carried.duplicates += 1;
            return false;
        }

        self.pending.push(mention);
        self.is_full()
    }

    /// 缓冲区是否已达到批量大小
    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.batch_size
    }

    /// 待写入的记录数
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 写入缓冲区中的全部记录并返回本次统计
    ///
    /// 缓冲区为空时不会访问存储
    pub async fn flush(&mut self) -> FlushStats {
        let mut stats = std::mem::take(&mut self.carried);
        if self.pending.is_empty() {
            return Self::publish(stats);
        }

        let batch = std::mem::take(&mut self.pending);
        match self.repo.insert_batch(&batch).await {
            Ok(inserted) => {
                let inserted = inserted.min(batch.len() as u64);
                stats.inserted += inserted;
                stats.duplicates += batch.len() as u64 - inserted;
            }
            Err(err) => {
                warn!(rows = batch.len(), error = %err, "batch insert failed, retrying row by row");
                for mention in &batch {
                    match self.repo.insert_one(mention).await {
                        Ok(InsertOutcome::Inserted) => stats.inserted += 1,
                        Ok(InsertOutcome::Duplicate) => stats.duplicates += 1,
                        Err(err) => {
                            warn!(url = %mention.source_url, error = %err, "mention insert failed");
                            stats.failed += 1;
                            stats
                                .failed_urls
                                .push(FailedUrl::new(mention.source_url.clone(), err.to_string()));
                        }
                    }
                }
            }
        }

        debug!(
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            failed = stats.failed,
            "flushed mentions"
        );
        Self::publish(stats)
    }

    fn publish(stats: FlushStats) -> FlushStats {
        counter!("mentions_inserted_total").increment(stats.inserted);
        counter!("mentions_duplicate_total").increment(stats.duplicates);
        stats
    }
}

#[cfg(test)]
#[path = "dedup_writer_test.rs"]
mod tests;
