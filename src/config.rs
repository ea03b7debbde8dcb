//! Service principal configuration.
//!
//! The samples read `azureCertSpConfig.json` or `azureSecretSpConfig.json`
//! from the config directory; the hybrid VM sample reads environment
//! variables instead.

use crate::azure::ClientCertificate;
use serde::Deserialize;
use std::error::Error;
use std::path::Path;

pub const CERT_CONFIG_FILE: &str = "azureCertSpConfig.json";
pub const SECRET_CONFIG_FILE: &str = "azureSecretSpConfig.json";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SpConfig {
    pub client_id: String,
    pub cert_pass: String,
    pub cert_path: String,
    pub client_secret: String,
    #[serde(alias = "ClientObjectId")]
    pub object_id: String,
    pub subscription_id: String,
    pub tenant_id: String,
    #[serde(rename = "ResourceManagerEndpointUrl", alias = "ResourceManagerUrl")]
    pub resource_manager_endpoint_url: String,
    pub location: String,
}

/// How the service principal proves its identity.
#[derive(Debug, Clone)]
pub enum AuthMode {
    Certificate(ClientCertificate),
    Secret,
}

impl AuthMode {
    pub fn is_secret(&self) -> bool {
        matches!(self, AuthMode::Secret)
    }
}

impl SpConfig {
    /// Read and parse one JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read configuration file {}: {e}", path.display()))?;
        let de = &mut serde_json::Deserializer::from_str(&data);
        let config: SpConfig = serde_path_to_error::deserialize(de).map_err(|e| {
            format!(
                "Failed to unmarshal data from {}: path={} error={}",
                path.display(),
                e.path(),
                e.inner()
            )
        })?;
        Ok(config)
    }

    /// Configuration from `AZURE_*` environment variables. Unset variables
    /// are left empty.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        SpConfig {
            resource_manager_endpoint_url: var("AZURE_ARM_ENDPOINT"),
            tenant_id: var("AZURE_TENANT_ID"),
            client_id: var("AZURE_SP_APP_ID"),
            client_secret: var("AZURE_SP_APP_SECRET"),
            subscription_id: var("AZURE_SUBSCRIPTION_ID"),
            location: var("AZURE_LOCATION"),
            ..Default::default()
        }
    }
}

fn load_cert_config(path: &Path) -> Option<(SpConfig, ClientCertificate)> {
    if !path.exists() {
        log::debug!("{} not found", path.display());
        return None;
    }
    let config = match SpConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}");
            return None;
        }
    };
    match ClientCertificate::from_file(&config.cert_path, &config.cert_pass) {
        Ok(cert) => Some((config, cert)),
        Err(e) => {
            println!("Unable to parse Certificate");
            log::warn!("certificate {}: {e}", config.cert_path);
            None
        }
    }
}

/// Pick the configuration file and authentication mode.
///
/// Unless `force_secret` is set, the certificate config wins when it parses
/// and its certificate loads. Otherwise the secret config is required.
pub fn load_sp_config(
    dir: impl AsRef<Path>,
    force_secret: bool,
) -> Result<(SpConfig, AuthMode), Box<dyn Error>> {
    let dir = dir.as_ref();
    let cert_path = dir.join(CERT_CONFIG_FILE);
    let secret_path = dir.join(SECRET_CONFIG_FILE);

    if !force_secret {
        if let Some((config, cert)) = load_cert_config(&cert_path) {
            log::info!("using certificate config {}", cert_path.display());
            return Ok((config, AuthMode::Certificate(cert)));
        }
        log::warn!("falling back to secret config {}", secret_path.display());
    }

    if !secret_path.exists() {
        return Err(format!(
            "The configuration files, {} & {}, don't exist.",
            secret_path.display(),
            cert_path.display()
        )
        .into());
    }
    let config = SpConfig::from_file(&secret_path).map_err(|e| {
        format!(
            "Failed to load configuration from {} & {}: {e}",
            secret_path.display(),
            cert_path.display()
        )
    })?;
    Ok((config, AuthMode::Secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SECRET_JSON: &str = r#"{
        "ClientId": "app-id",
        "ClientSecret": "s3cret",
        "ObjectId": "object-id",
        "SubscriptionId": "sub-id",
        "TenantId": "tenant-id",
        "ResourceManagerEndpointUrl": "https://management.local.azurestack.external/",
        "Location": "local"
    }"#;

    fn cert_json(cert_path: &str) -> String {
        cert_json_with_pass(cert_path, "")
    }

    fn cert_json_with_pass(cert_path: &str, cert_pass: &str) -> String {
        format!(
            r#"{{"ClientId":"app-id","CertPath":"{cert_path}","CertPass":"{cert_pass}","SubscriptionId":"sub-id",
                "TenantId":"tenant-id","ResourceManagerEndpointUrl":"https://management.local.azurestack.external/",
                "Location":"local"}}"#
        )
    }

    #[test]
    fn test_from_file_defaults_missing_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SECRET_CONFIG_FILE);
        fs::write(&path, SECRET_JSON).expect("write config");

        let config = SpConfig::from_file(&path).expect("parse config");
        assert_eq!(config.client_id, "app-id");
        assert_eq!(config.client_secret, "s3cret");
        assert_eq!(config.location, "local");
        assert_eq!(config.cert_path, "");
    }

    #[test]
    fn test_from_file_accepts_dataplane_aliases() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"ResourceManagerUrl":"https://management.local/","ClientObjectId":"oid"}"#,
        )
        .expect("write config");

        let config = SpConfig::from_file(&path).expect("parse config");
        assert_eq!(config.resource_manager_endpoint_url, "https://management.local/");
        assert_eq!(config.object_id, "oid");
    }

    #[test]
    fn test_from_file_reports_json_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"ClientId": 42}"#).expect("write config");

        let err = SpConfig::from_file(&path).expect_err("bad type");
        assert!(err.to_string().contains("path=ClientId"), "{err}");
    }

    #[test]
    fn test_load_prefers_certificate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pem = dir.path().join("sp.pem");
        fs::write(&pem, include_str!("../tests/data/sp-cert.pem")).expect("write pem");
        fs::write(
            dir.path().join(CERT_CONFIG_FILE),
            cert_json(&pem.display().to_string()),
        )
        .expect("write cert config");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), SECRET_JSON).expect("write secret config");

        let (config, mode) = load_sp_config(dir.path(), false).expect("load config");
        assert!(!mode.is_secret());
        assert_eq!(config.cert_path, pem.display().to_string());
    }

    #[test]
    fn test_load_forced_secret() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(CERT_CONFIG_FILE), cert_json("/nowhere.pem"))
            .expect("write cert config");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), SECRET_JSON).expect("write secret config");

        let (config, mode) = load_sp_config(dir.path(), true).expect("load config");
        assert!(mode.is_secret());
        assert_eq!(config.client_secret, "s3cret");
    }

    #[test]
    fn test_load_falls_back_on_bad_certificate() {
        let dir = tempfile::tempdir().expect("temp dir");
        let bad = dir.path().join("bad.pem");
        fs::write(&bad, "not a certificate").expect("write pem");
        fs::write(
            dir.path().join(CERT_CONFIG_FILE),
            cert_json(&bad.display().to_string()),
        )
        .expect("write cert config");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), SECRET_JSON).expect("write secret config");

        let (_, mode) = load_sp_config(dir.path(), false).expect("load config");
        assert!(mode.is_secret());
    }

    #[test]
    fn test_load_falls_back_on_misordered_pem_markers() {
        let dir = tempfile::tempdir().expect("temp dir");
        let bad = dir.path().join("bad.pem");
        fs::write(&bad, "-----END A-----\n-----BEGIN A-----\nQQ==\n-----END A-----\n")
            .expect("write pem");
        fs::write(
            dir.path().join(CERT_CONFIG_FILE),
            cert_json(&bad.display().to_string()),
        )
        .expect("write cert config");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), SECRET_JSON).expect("write secret config");

        let (config, mode) = load_sp_config(dir.path(), false).expect("load config");
        assert!(mode.is_secret());
        assert_eq!(config.client_secret, "s3cret");
    }

    #[test]
    fn test_load_pkcs12_with_cert_pass() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pfx = dir.path().join("sp.pfx");
        fs::write(&pfx, include_bytes!("../tests/data/sp-cert.pfx")).expect("write pfx");
        fs::write(
            dir.path().join(CERT_CONFIG_FILE),
            cert_json_with_pass(&pfx.display().to_string(), "Pa55word"),
        )
        .expect("write cert config");

        let (config, mode) = load_sp_config(dir.path(), false).expect("load config");
        assert_eq!(config.cert_pass, "Pa55word");
        match mode {
            AuthMode::Certificate(cert) => {
                assert_eq!(cert.thumbprint(), "lyRMoQNfbas3VKE4aM4e2-nm9cE")
            }
            AuthMode::Secret => panic!("expected the certificate config"),
        }
    }

    #[test]
    fn test_load_pkcs12_wrong_cert_pass_falls_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pfx = dir.path().join("sp.pfx");
        fs::write(&pfx, include_bytes!("../tests/data/sp-cert.pfx")).expect("write pfx");
        fs::write(
            dir.path().join(CERT_CONFIG_FILE),
            cert_json_with_pass(&pfx.display().to_string(), "wrong"),
        )
        .expect("write cert config");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), SECRET_JSON).expect("write secret config");

        let (_, mode) = load_sp_config(dir.path(), false).expect("load config");
        assert!(mode.is_secret());
    }

    #[test]
    fn test_load_without_files_names_both() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_sp_config(dir.path(), false).expect_err("no config");
        let msg = err.to_string();
        assert!(msg.contains(SECRET_CONFIG_FILE));
        assert!(msg.contains(CERT_CONFIG_FILE));
    }

    #[test]
    fn test_load_unparsable_secret_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(SECRET_CONFIG_FILE), "{ not json").expect("write config");
        let err = load_sp_config(dir.path(), true).expect_err("bad json");
        assert!(err.to_string().contains(CERT_CONFIG_FILE));
    }
}
