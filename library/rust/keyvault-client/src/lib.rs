//! k1s0-keyvault-client: Azure Key Vault REST API クライアントライブラリ。
//!
//! 証明書・キー・シークレットの取得と、複数シークレットの並行一括取得を提供する。
//!
//! # 使い方
//!
//! ```ignore
//! use k1s0_keyvault_client::{GetSecretsOptions, KeyVaultClient, KeyVaultConfig};
//!
//! let client = KeyVaultClient::new(KeyVaultConfig::new("my-vault"), bearer_token)?;
//!
//! let secret = client.get_secret("db-password", None).await?;
//!
//! // 名前 → 値のマップとして一括取得
//! let secrets = client
//!     .get_secrets(&["db-password", "api-key/3f2a"], &GetSecretsOptions::secrets_object())
//!     .await?;
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod fetcher;
pub mod resource;
pub mod secret;

pub use batch::{FetchedSecret, GetSecretsOptions, SecretOutcome, SecretsResult};
pub use client::KeyVaultClient;
pub use config::KeyVaultConfig;
pub use credential::{Credential, TokenResponse};
pub use error::{BatchFailure, FailedSecret, KeyVaultError, BATCH_FAILURE_MESSAGE};
pub use fetcher::{HttpResourceFetcher, ResourceFetcher};
pub use resource::ResourceKind;
pub use secret::{SecretBundle, SecretId, SecretItem, SecretListing};

#[cfg(any(test, feature = "mock"))]
pub use fetcher::MockResourceFetcher;
