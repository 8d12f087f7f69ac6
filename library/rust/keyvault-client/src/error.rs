//! Key Vault クライアントのエラー定義。

use thiserror::Error;

/// 一括取得が失敗したときの表示メッセージ。
pub const BATCH_FAILURE_MESSAGE: &str = "One or more secrets could not be fetched.";

/// KeyVaultError は Key Vault 呼び出しで発生するエラーを表す。
///
/// 単一リソース取得ではリモートのエラーメッセージ・トランスポートのエラーメッセージを
/// そのまま `Display` に出す。
#[derive(Debug, Clone, Error)]
pub enum KeyVaultError {
    /// Key Vault が 200 以外のステータスを返した。
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// 接続拒否・DNS 失敗などのトランスポートエラー。
    #[error("{0}")]
    Transport(String),

    /// レスポンスボディを JSON として解析できなかった。
    #[error("レスポンスの解析に失敗しました: {0}")]
    Decode(String),

    /// レコードの id から名前・バージョンを取り出せなかった。
    #[error("不正なシークレットレコードです: {0}")]
    MalformedRecord(String),

    /// 一括取得で 1 件以上のシークレットが取得できなかった。
    #[error("{}", BATCH_FAILURE_MESSAGE)]
    BatchFailed(BatchFailure),

    /// 設定の読み込み、または HTTP クライアントの生成に失敗した。
    #[error("設定が不正です: {0}")]
    InvalidConfig(String),
}

/// FailedSecret は一括取得で失敗した 1 件の識別子とその理由。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSecret {
    pub identifier: String,
    pub message: String,
}

/// BatchFailure は一括取得の失敗詳細を保持する。
///
/// 表示上は一律のメッセージだが、個々の失敗は `failures()` で参照できる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    failures: Vec<FailedSecret>,
}

impl BatchFailure {
    pub fn new(failures: Vec<FailedSecret>) -> Self {
        Self { failures }
    }

    /// 失敗した識別子を入力順で返す。
    pub fn failures(&self) -> &[FailedSecret] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}
