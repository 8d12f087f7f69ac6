//! 複数シークレットの一括取得（ファンアウト → 全件確定 → 集約）。

use std::collections::BTreeMap;
use std::future::Future;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BatchFailure, FailedSecret, KeyVaultError};
use crate::secret::SecretId;

/// GetSecretsOptions は `get_secrets` の挙動を切り替えるオプション。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetSecretsOptions {
    /// true の場合、結果を「シークレット名 → 値」のマップに変換する。
    pub secrets_object: bool,
}

impl GetSecretsOptions {
    pub fn secrets_object() -> Self {
        Self {
            secrets_object: true,
        }
    }
}

/// SecretOutcome は 1 識別子分の確定済み取得結果。失敗時はメッセージのみ保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct SecretOutcome {
    pub identifier: String,
    pub result: Result<Value, String>,
}

impl SecretOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// FetchedSecret は取得に成功したレコードと、要求した識別子の組。
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSecret {
    pub identifier: String,
    pub record: Value,
}

/// SecretsResult は `get_secrets` の戻り値。
#[derive(Debug, Clone, PartialEq)]
pub enum SecretsResult {
    /// 入力順のレコード列。
    Records(Vec<FetchedSecret>),
    /// シークレット名 → 値。
    Map(BTreeMap<String, Value>),
}

impl SecretsResult {
    pub fn len(&self) -> usize {
        match self {
            SecretsResult::Records(records) => records.len(),
            SecretsResult::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Option<Vec<FetchedSecret>> {
        match self {
            SecretsResult::Records(records) => Some(records),
            SecretsResult::Map(_) => None,
        }
    }

    pub fn into_map(self) -> Option<BTreeMap<String, Value>> {
        match self {
            SecretsResult::Map(map) => Some(map),
            SecretsResult::Records(_) => None,
        }
    }
}

/// 識別子ごとに `fetch` を発行し、全件が確定するまで待つ。
///
/// 同時実行数は `max_concurrency` まで。個々の失敗で打ち切らず、結果は入力順に並ぶ。
pub async fn settle_all<S, F, Fut>(
    identifiers: &[S],
    max_concurrency: usize,
    fetch: F,
) -> Vec<SecretOutcome>
where
    S: AsRef<str>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Value, KeyVaultError>>,
{
    debug!(
        count = identifiers.len(),
        max_concurrency, "シークレットを並行取得します"
    );

    stream::iter(identifiers.iter().map(|id| id.as_ref().to_string()))
        .map(|identifier| {
            let pending = fetch(identifier.clone());
            async move {
                let result = pending.await.map_err(|e| e.to_string());
                SecretOutcome { identifier, result }
            }
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await
}

/// 確定済みの結果を成功・失敗に振り分けて集約する。
///
/// 1 件でも失敗があれば `KeyVaultError::BatchFailed` を返す。
/// 200 でも `id` を持たないボディは失敗として扱う。
pub fn aggregate(
    outcomes: Vec<SecretOutcome>,
    options: &GetSecretsOptions,
) -> Result<SecretsResult, KeyVaultError> {
    let total = outcomes.len();
    let mut records = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for SecretOutcome { identifier, result } in outcomes {
        match result {
            Ok(record) if record.get("id").is_some() => {
                records.push(FetchedSecret { identifier, record });
            }
            Ok(_) => failures.push(FailedSecret {
                identifier,
                message: "レスポンスに id が含まれていません".to_string(),
            }),
            Err(message) => failures.push(FailedSecret {
                identifier,
                message,
            }),
        }
    }

    if !failures.is_empty() {
        warn!(
            failed = failures.len(),
            total, "一部のシークレットを取得できませんでした"
        );
        return Err(KeyVaultError::BatchFailed(BatchFailure::new(failures)));
    }

    if options.secrets_object {
        reshape(records).map(SecretsResult::Map)
    } else {
        Ok(SecretsResult::Records(records))
    }
}

/// レコード列を「id の末尾から 2 番目のセグメント → value」のマップに変換する。
/// 名前が衝突した場合は後勝ち。
fn reshape(records: Vec<FetchedSecret>) -> Result<BTreeMap<String, Value>, KeyVaultError> {
    let mut map = BTreeMap::new();
    for FetchedSecret { identifier, record } in records {
        let id = record.get("id").and_then(Value::as_str).ok_or_else(|| {
            KeyVaultError::MalformedRecord(format!("id が文字列ではありません: {identifier}"))
        })?;
        let SecretId { name, .. } = SecretId::parse(id)?;
        let value = record.get("value").cloned().unwrap_or(Value::Null);
        if map.insert(name.clone(), value).is_some() {
            warn!(name = %name, identifier = %identifier, "同名のシークレットを上書きします");
        }
    }
    Ok(map)
}
