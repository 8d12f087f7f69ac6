//! クライアント生成時に受け取る認証情報。

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// TokenResponse は OAuth2 トークンエンドポイントのレスポンス形式。
///
/// このクレートが使うのは `access_token` のみで、それ以外のフィールドは無視する。
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
        }
    }
}

/// Credential は生のベアラートークン、またはトークンレスポンスのどちらかを表す。
///
/// いずれの形でもクライアント生成時に一度だけトークンへ解決され、以降は変更されない。
#[derive(Debug, Clone)]
pub enum Credential {
    RawToken(String),
    TokenResponse(TokenResponse),
}

impl Credential {
    /// 保持するベアラートークンを取り出す。
    pub fn into_token(self) -> SecretString {
        match self {
            Credential::RawToken(token) => SecretString::new(token),
            Credential::TokenResponse(response) => SecretString::new(response.access_token),
        }
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Credential::RawToken(token.to_string())
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Credential::RawToken(token)
    }
}

impl From<TokenResponse> for Credential {
    fn from(response: TokenResponse) -> Self {
        Credential::TokenResponse(response)
    }
}

/// bearer_header は Authorization ヘッダー値を組み立てる。
pub(crate) fn bearer_header(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
