//! Key Vault クライアントの設定構造体。

use serde::{Deserialize, Serialize};

use crate::error::KeyVaultError;

/// api_version のデフォルト値。
pub const DEFAULT_API_VERSION: &str = "7.0";

/// max_concurrency のデフォルト値。
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

/// KeyVaultConfig は Key Vault クライアントの設定を表す。
///
/// YAML または JSON から serde でデシリアライズ可能。
/// 省略されたフィールドにはデフォルト値が使われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVaultConfig {
    /// Key Vault 名。`https://{vault_name}.vault.azure.net` の組み立てに使う。
    pub vault_name: String,

    /// ベース URI の上書き（ソブリンクラウド・エミュレータ・テスト用）。
    #[serde(default)]
    pub base_uri: Option<String>,

    /// REST API バージョン（デフォルト: 7.0）。
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// HTTP タイムアウト秒数。省略時はトランスポート既定の挙動に従う。
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// 一括取得時の同時リクエスト上限（デフォルト: 16）。
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl KeyVaultConfig {
    pub fn new(vault_name: impl Into<String>) -> Self {
        Self {
            vault_name: vault_name.into(),
            base_uri: None,
            api_version: default_api_version(),
            timeout_secs: None,
            max_concurrency: default_max_concurrency(),
        }
    }

    /// YAML 文字列から設定を読み込む。
    pub fn from_yaml_str(yaml: &str) -> Result<Self, KeyVaultError> {
        serde_yaml::from_str(yaml).map_err(|e| KeyVaultError::InvalidConfig(e.to_string()))
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// 実際にリクエストを送るベース URI を返す（末尾の `/` は除去する）。
    pub fn resolved_base_uri(&self) -> String {
        match &self.base_uri {
            Some(uri) => uri.trim_end_matches('/').to_string(),
            None => format!("https://{}.vault.azure.net", self.vault_name),
        }
    }

    /// 0 が指定されても最低 1 件は並行実行する。
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
