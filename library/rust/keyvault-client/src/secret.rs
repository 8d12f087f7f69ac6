use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::KeyVaultError;

/// SecretId はレコードの `id`（`https://{vault}/secrets/{name}/{version}`）から
/// 取り出した名前とバージョン。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretId {
    pub name: String,
    pub version: String,
}

impl SecretId {
    /// `/` 区切りの末尾 2 セグメントを `{name}/{version}` として解釈する。
    pub fn parse(id: &str) -> Result<Self, KeyVaultError> {
        let mut segments = id.rsplit('/');
        match (segments.next(), segments.next()) {
            (Some(version), Some(name)) => Ok(Self {
                name: name.to_string(),
                version: version.to_string(),
            }),
            _ => Err(KeyVaultError::MalformedRecord(format!(
                "id に名前とバージョンが含まれていません: {id}"
            ))),
        }
    }
}

/// SecretBundle は GET /secrets/{name} のレスポンスの型付きビュー。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretBundle {
    pub id: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub attributes: Option<SecretAttributes>,
}

impl SecretBundle {
    pub fn from_value(record: Value) -> Result<Self, KeyVaultError> {
        serde_json::from_value(record).map_err(|e| KeyVaultError::Decode(e.to_string()))
    }

    pub fn secret_id(&self) -> Result<SecretId, KeyVaultError> {
        SecretId::parse(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretAttributes {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// SecretItem は一覧レスポンス中の 1 件。値は含まれない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretItem {
    pub id: String,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub attributes: Option<SecretAttributes>,
}

impl SecretItem {
    /// 一覧の id は `{base}/secrets/{name}` 形式なので末尾セグメントが名前になる。
    pub fn name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// SecretListing は GET /secrets のレスポンス 1 ページ分。
#[derive(Debug, Clone, Deserialize)]
pub struct SecretListing {
    #[serde(default)]
    pub value: Vec<SecretItem>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

impl SecretListing {
    pub fn from_value(body: Value) -> Result<Self, KeyVaultError> {
        serde_json::from_value(body).map_err(|e| KeyVaultError::Decode(e.to_string()))
    }
}
