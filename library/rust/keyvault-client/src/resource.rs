use std::fmt;

/// Key Vault の取得対象リソース種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Certificates,
    Keys,
    Secrets,
}

impl ResourceKind {
    pub fn as_path(self) -> &'static str {
        match self {
            ResourceKind::Certificates => "certificates",
            ResourceKind::Keys => "keys",
            ResourceKind::Secrets => "secrets",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// `name` または `name/version` のパスセグメントを組み立てる。
pub fn name_with_version(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{name}/{version}"),
        None => name.to_string(),
    }
}

/// `{base}/{kind}/{path}?api-version={api_version}` を組み立てる。
///
/// path は検証せずにそのまま埋め込む。
pub fn resource_uri(base_uri: &str, kind: ResourceKind, path: &str, api_version: &str) -> String {
    format!("{base_uri}/{kind}/{path}?api-version={api_version}")
}

/// 一覧取得用の `{base}/{kind}?api-version={api_version}` を組み立てる。
pub fn collection_uri(base_uri: &str, kind: ResourceKind, api_version: &str) -> String {
    format!("{base_uri}/{kind}?api-version={api_version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://vault1.vault.azure.net";

    #[test]
    fn test_name_with_version() {
        assert_eq!(name_with_version("cert", None), "cert");
        assert_eq!(name_with_version("cert", Some("v1")), "cert/v1");
    }

    #[test]
    fn test_resource_uri_per_kind() {
        assert_eq!(
            resource_uri(BASE, ResourceKind::Certificates, "cert", "7.0"),
            "https://vault1.vault.azure.net/certificates/cert?api-version=7.0"
        );
        assert_eq!(
            resource_uri(BASE, ResourceKind::Keys, "key/v2", "7.0"),
            "https://vault1.vault.azure.net/keys/key/v2?api-version=7.0"
        );
        assert_eq!(
            resource_uri(BASE, ResourceKind::Secrets, "secret", "7.0"),
            "https://vault1.vault.azure.net/secrets/secret?api-version=7.0"
        );
    }

    #[test]
    fn test_collection_uri() {
        assert_eq!(
            collection_uri(BASE, ResourceKind::Secrets, "7.0"),
            "https://vault1.vault.azure.net/secrets?api-version=7.0"
        );
    }
}
