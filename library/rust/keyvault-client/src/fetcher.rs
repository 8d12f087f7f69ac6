//! Resource Fetcher: URI とベアラートークンで JSON リソースを GET する。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credential::bearer_header;
use crate::error::KeyVaultError;

/// ResourceFetcher は Key Vault REST API への GET を抽象化するトレイト。
///
/// `HttpResourceFetcher` がデフォルト実装。テスト時は `MockResourceFetcher` が使用可能。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// 200 の場合は解析済みのボディをそのまま返す。
    ///
    /// 200 以外は `KeyVaultError::Remote`、送信自体の失敗は `KeyVaultError::Transport`。
    async fn fetch(&self, uri: &str, token: &SecretString) -> Result<Value, KeyVaultError>;
}

/// HttpResourceFetcher は reqwest を使った ResourceFetcher の HTTP 実装。
///
/// リトライは行わない。タイムアウトは指定時のみ設定する。
#[derive(Debug, Clone)]
pub struct HttpResourceFetcher {
    http: reqwest::Client,
}

impl HttpResourceFetcher {
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, KeyVaultError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| KeyVaultError::InvalidConfig(e.to_string()))?;
        Ok(Self { http })
    }

    /// 既存の reqwest::Client を共有して生成する。
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch(&self, uri: &str, token: &SecretString) -> Result<Value, KeyVaultError> {
        debug!(uri = %uri, "Key Vault リソースを取得します");

        let resp = self
            .http
            .get(uri)
            .header(AUTHORIZATION, bearer_header(token))
            .send()
            .await
            .map_err(|e| {
                warn!(uri = %uri, error = %e, "Key Vault への HTTP リクエストに失敗しました");
                KeyVaultError::Transport(e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| KeyVaultError::Transport(e.to_string()))?;

        if status != StatusCode::OK {
            let message = remote_error_message(status.as_u16(), &body);
            warn!(uri = %uri, status = %status, message = %message, "Key Vault がエラーを返しました");
            return Err(KeyVaultError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| KeyVaultError::Decode(e.to_string()))
    }
}

/// エラーボディの `error.message` を取り出す。
/// 期待する形でない場合はステータスコードから汎用メッセージを作る。
pub(crate) fn remote_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("remote service returned status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token() -> SecretString {
        SecretString::new("abcdef".to_string())
    }

    #[test]
    fn test_remote_error_message_extracts_field() {
        let body = r#"{"error":{"code":"Forbidden","message":"No such certificate."}}"#;
        assert_eq!(remote_error_message(403, body), "No such certificate.");
    }

    #[test]
    fn test_remote_error_message_fallback_on_missing_field() {
        assert_eq!(
            remote_error_message(500, r#"{"detail":"boom"}"#),
            "remote service returned status 500"
        );
        assert_eq!(
            remote_error_message(502, "<html>Bad Gateway</html>"),
            "remote service returned status 502"
        );
        assert_eq!(
            remote_error_message(404, r#"{"error":{"message":42}}"#),
            "remote service returned status 404"
        );
    }

    #[tokio::test]
    async fn test_fetch_success_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets/db"))
            .and(query_param("api-version", "7.0"))
            .and(header("Authorization", "Bearer abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "https://vault1.vault.azure.net/secrets/db/v1",
                "value": "s3cr3t"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::new(None).unwrap();
        let uri = format!("{}/secrets/db?api-version=7.0", server.uri());
        let body = fetcher.fetch(&uri, &token()).await.unwrap();
        assert_eq!(body["value"], "s3cr3t");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_with_client_shares_existing_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certificates/cert"))
            .and(header("Authorization", "Bearer abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "id" })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::with_client(reqwest::Client::new());
        let uri = format!("{}/certificates/cert?api-version=7.0", server.uri());
        let body = fetcher.fetch(&uri, &token()).await.unwrap();
        assert_eq!(body["id"], "id");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_fetch_non_200_uses_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys/missing"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": "Forbidden", "message": "No such key." }
            })))
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::new(Some(5)).unwrap();
        let uri = format!("{}/keys/missing?api-version=7.0", server.uri());
        let err = fetcher.fetch(&uri, &token()).await.unwrap_err();
        assert_eq!(err.to_string(), "No such key.");
        assert!(matches!(err, KeyVaultError::Remote { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_fetch_non_200_without_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::new(None).unwrap();
        let uri = format!("{}/secrets/a?api-version=7.0", server.uri());
        let err = fetcher.fetch(&uri, &token()).await.unwrap_err();
        assert_eq!(err.to_string(), "remote service returned status 503");
    }

    #[tokio::test]
    async fn test_fetch_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::new(None).unwrap();
        let uri = format!("{}/secrets/a?api-version=7.0", server.uri());
        let err = fetcher.fetch(&uri, &token()).await.unwrap_err();
        assert!(matches!(err, KeyVaultError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        // ポート 1 には何も listen していない
        let fetcher = HttpResourceFetcher::new(Some(5)).unwrap();
        let err = fetcher
            .fetch("http://127.0.0.1:1/secrets/a?api-version=7.0", &token())
            .await
            .unwrap_err();
        assert!(matches!(err, KeyVaultError::Transport(_)));
    }
}
