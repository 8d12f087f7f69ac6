use std::collections::HashSet;
use std::sync::Arc;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::batch::{aggregate, settle_all, GetSecretsOptions, SecretOutcome, SecretsResult};
use crate::config::KeyVaultConfig;
use crate::credential::Credential;
use crate::error::KeyVaultError;
use crate::fetcher::{HttpResourceFetcher, ResourceFetcher};
use crate::resource::{collection_uri, name_with_version, resource_uri, ResourceKind};
use crate::secret::{SecretBundle, SecretItem, SecretListing};

/// `list_all_secrets` がたどる nextLink の上限。
const MAX_LIST_PAGES: usize = 1000;

/// KeyVaultClient は Azure Key Vault REST API のクライアント。
///
/// トークンは生成時に一度だけ解決され、以降すべてのリクエストで共有される。
/// キャッシュ・トークン更新・リトライは行わない。
pub struct KeyVaultClient {
    config: KeyVaultConfig,
    base_uri: String,
    token: Arc<SecretString>,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl KeyVaultClient {
    /// reqwest ベースの fetcher でクライアントを生成する。
    pub fn new(
        config: KeyVaultConfig,
        credential: impl Into<Credential>,
    ) -> Result<Self, KeyVaultError> {
        let fetcher = HttpResourceFetcher::new(config.timeout_secs)?;
        Ok(Self::with_fetcher(config, credential, Arc::new(fetcher)))
    }

    pub fn with_fetcher(
        config: KeyVaultConfig,
        credential: impl Into<Credential>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let base_uri = config.resolved_base_uri();
        Self {
            config,
            base_uri,
            token: Arc::new(credential.into().into_token()),
            fetcher,
        }
    }

    pub fn config(&self) -> &KeyVaultConfig {
        &self.config
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// 証明書を取得する。version を省略すると最新版を返す。
    pub async fn get_certificate(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Value, KeyVaultError> {
        self.get_resource(ResourceKind::Certificates, name, version)
            .await
    }

    /// キーを取得する。
    pub async fn get_key(&self, name: &str, version: Option<&str>) -> Result<Value, KeyVaultError> {
        self.get_resource(ResourceKind::Keys, name, version).await
    }

    /// シークレットを取得する。
    pub async fn get_secret(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Value, KeyVaultError> {
        self.get_resource(ResourceKind::Secrets, name, version)
            .await
    }

    /// 複数のシークレットを並行取得する。
    ///
    /// 識別子は `name` または `name/version`。1 件でも取得に失敗すると
    /// `KeyVaultError::BatchFailed` を返し、個々の失敗理由はその中に保持される。
    /// `options.secrets_object` が true の場合は名前 → 値のマップを返す。
    pub async fn get_secrets<S: AsRef<str>>(
        &self,
        identifiers: &[S],
        options: &GetSecretsOptions,
    ) -> Result<SecretsResult, KeyVaultError> {
        let outcomes = self.get_secrets_settled(identifiers).await;
        aggregate(outcomes, options)
    }

    /// 複数のシークレットを並行取得し、集約せずに識別子ごとの結果を入力順で返す。
    pub async fn get_secrets_settled<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> Vec<SecretOutcome> {
        let fetcher = self.fetcher.as_ref();
        let token = self.token.as_ref();
        let base_uri = self.base_uri.as_str();
        let api_version = self.config.api_version.as_str();

        settle_all(
            identifiers,
            self.config.effective_concurrency(),
            move |identifier| {
                let uri = resource_uri(base_uri, ResourceKind::Secrets, &identifier, api_version);
                async move { fetcher.fetch(&uri, token).await }
            },
        )
        .await
    }

    /// シークレット一覧の 1 ページ目を取得し、ボディをそのまま返す。
    pub async fn list_secrets(&self) -> Result<Value, KeyVaultError> {
        let uri = collection_uri(
            &self.base_uri,
            ResourceKind::Secrets,
            &self.config.api_version,
        );
        self.fetcher.fetch(&uri, &self.token).await
    }

    /// `nextLink` をたどってシークレット一覧を全件取得する。
    ///
    /// `nextLink` はベース URI 配下のみ許可し、同じリンクの再訪と
    /// `MAX_LIST_PAGES` 超過はエラーにする。
    pub async fn list_all_secrets(&self) -> Result<Vec<SecretItem>, KeyVaultError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut page = SecretListing::from_value(self.list_secrets().await?)?;
        loop {
            items.append(&mut page.value);
            let Some(next) = page.next_link.take() else {
                break;
            };
            self.check_next_link(&next)?;
            if !visited.insert(next.clone()) {
                return Err(KeyVaultError::MalformedRecord(format!(
                    "nextLink が循環しています: {next}"
                )));
            }
            if visited.len() >= MAX_LIST_PAGES {
                return Err(KeyVaultError::MalformedRecord(format!(
                    "一覧のページ数が上限 {MAX_LIST_PAGES} を超えました"
                )));
            }
            debug!(next_link = %next, "次のページを取得します");
            page = SecretListing::from_value(self.fetcher.fetch(&next, &self.token).await?)?;
        }
        Ok(items)
    }

    /// トークンを送ってよいのはベース URI 配下のリンクのみ。
    fn check_next_link(&self, next: &str) -> Result<(), KeyVaultError> {
        let allowed = next
            .strip_prefix(self.base_uri.as_str())
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'));
        if allowed {
            Ok(())
        } else {
            warn!(next_link = %next, base_uri = %self.base_uri, "ベース URI 外の nextLink を拒否しました");
            Err(KeyVaultError::MalformedRecord(format!(
                "nextLink がベース URI 配下ではありません: {next}"
            )))
        }
    }

    /// シークレットを取得し、型付きの `SecretBundle` として返す。
    pub async fn get_secret_bundle(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<SecretBundle, KeyVaultError> {
        SecretBundle::from_value(self.get_secret(name, version).await?)
    }

    async fn get_resource(
        &self,
        kind: ResourceKind,
        name: &str,
        version: Option<&str>,
    ) -> Result<Value, KeyVaultError> {
        let path = name_with_version(name, version);
        let uri = resource_uri(&self.base_uri, kind, &path, &self.config.api_version);
        self.fetcher.fetch(&uri, &self.token).await
    }
}
