// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// 搜索服务凭证
///
/// 与具体的搜索客户端无关；`api_key` 不会出现在 Debug 输出和日志中
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// 凭证标识
    pub id: String,
    /// API 密钥
    pub api_key: String,
    /// 搜索引擎 ID
    pub engine_id: String,
    /// 每日配额
    pub quota_limit: u64,
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        quota_limit: u64,
    ) -> Self {
        Self {
            id: id.into(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            quota_limit,
        }
    }

    /// 密钥指纹，用于日志中区分凭证
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.api_key.as_bytes());
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("key", &self.fingerprint())
            .field("engine_id", &self.engine_id)
            .field("quota_limit", &self.quota_limit)
            .finish()
    }
}

/// 凭证配额使用情况快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialState {
    pub credential_id: String,
    pub quota_limit: u64,
    pub used_today: u64,
}

impl CredentialState {
    pub fn is_exhausted(&self) -> bool {
        self.used_today >= self.quota_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_api_key() {
        let cred = Credential::new("google-1", "super-secret-key", "cx-1", 100);
        let printed = format!("{:?}", cred);
        assert!(!printed.contains("super-secret-key"));
        assert!(printed.contains(&cred.fingerprint()));
        assert_eq!(cred.fingerprint().len(), 8);
    }
}
