//! Cloud environment discovery from an ARM endpoint.
//!
//! Azure Stack Hub publishes its login endpoint and token audience at
//! `{arm}/metadata/endpoints`. Everything else a sample needs is derived
//! from the ARM host name.

use super::error::{ArmError, Result};
use serde::Deserialize;
use url::Url;

const METADATA_API_VERSION: &str = "2015-01-01";

/// Tenant id to use against an ADFS identity provider.
pub const ADFS_TENANT: &str = "adfs";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    #[serde(default)]
    pub gallery_endpoint: String,
    #[serde(default)]
    pub graph_endpoint: String,
    pub authentication: MetadataAuthentication,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAuthentication {
    pub login_endpoint: String,
    #[serde(default)]
    pub audiences: Vec<String>,
}

/// Endpoints of one cloud instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub resource_manager_endpoint: String,
    pub active_directory_endpoint: String,
    pub token_audience: String,
    pub storage_endpoint_suffix: String,
    pub key_vault_dns_suffix: String,
    pub gallery_endpoint: String,
    pub graph_endpoint: String,
}

impl Environment {
    /// Fetch the metadata document of `arm_endpoint` and build the environment.
    pub async fn from_url(http: &reqwest::Client, arm_endpoint: &str) -> Result<Self> {
        let mut url = Url::parse(arm_endpoint)?.join("metadata/endpoints")?;
        url.query_pairs_mut()
            .append_pair("api-version", METADATA_API_VERSION);
        log::debug!("GET {url}");

        let resp = http.get(url.clone()).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ArmError::from_response("GET", url.as_str(), status, &body));
        }

        let mut de = serde_json::Deserializer::from_slice(&body);
        let doc: MetadataDocument =
            serde_path_to_error::deserialize(&mut de).map_err(ArmError::decode)?;
        Self::from_metadata(arm_endpoint, doc)
    }

    pub fn from_metadata(arm_endpoint: &str, doc: MetadataDocument) -> Result<Self> {
        let url = Url::parse(arm_endpoint)?;
        let host = url.host_str().unwrap_or_default();
        let domain = host.split('.').skip(1).collect::<Vec<_>>().join(".");
        let token_audience = doc
            .authentication
            .audiences
            .first()
            .cloned()
            .ok_or_else(|| ArmError::Decode {
                path: "authentication.audiences".to_string(),
                message: "metadata lists no token audience".to_string(),
            })?;

        Ok(Environment {
            name: "AzureStackCloud".to_string(),
            resource_manager_endpoint: arm_endpoint.to_string(),
            active_directory_endpoint: doc.authentication.login_endpoint,
            token_audience,
            key_vault_dns_suffix: format!("vault.{domain}"),
            storage_endpoint_suffix: domain,
            gallery_endpoint: doc.gallery_endpoint,
            graph_endpoint: doc.graph_endpoint,
        })
    }

    /// True when the identity provider is ADFS rather than Azure AD.
    pub fn is_adfs(&self) -> bool {
        is_adfs_endpoint(&self.active_directory_endpoint)
    }

    /// The tenant to authenticate against: `adfs` on ADFS stamps, the
    /// configured tenant otherwise.
    pub fn effective_tenant<'a>(&self, tenant: &'a str) -> &'a str {
        if self.is_adfs() {
            ADFS_TENANT
        } else {
            tenant
        }
    }
}

/// An endpoint is ADFS when its last path segment is `adfs`.
pub fn is_adfs_endpoint(endpoint: &str) -> bool {
    endpoint.trim_end_matches('/').rsplit('/').next() == Some(ADFS_TENANT)
}

/// Storage suffix as the dataplane sample derives it: everything after the
/// first `.` of the ARM URL, without trailing slashes.
pub fn storage_suffix_from_arm_url(arm_url: &str) -> &str {
    match arm_url.find('.') {
        Some(i) => arm_url[i + 1..].trim_end_matches('/'),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(login: &str) -> MetadataDocument {
        MetadataDocument {
            gallery_endpoint: "https://providers.local.azurestack.external:30016/".to_string(),
            graph_endpoint: "https://graph.local.azurestack.external/".to_string(),
            authentication: MetadataAuthentication {
                login_endpoint: login.to_string(),
                audiences: vec!["https://management.adfs.azurestack.local/4de154de".to_string()],
            },
        }
    }

    #[test]
    fn test_from_metadata_derives_suffixes() {
        let env = Environment::from_metadata(
            "https://management.local.azurestack.external/",
            metadata("https://adfs.local.azurestack.external/adfs"),
        )
        .expect("valid metadata");
        assert_eq!(env.storage_endpoint_suffix, "local.azurestack.external");
        assert_eq!(env.key_vault_dns_suffix, "vault.local.azurestack.external");
        assert_eq!(
            env.token_audience,
            "https://management.adfs.azurestack.local/4de154de"
        );
        assert!(env.is_adfs());
        assert_eq!(env.effective_tenant("my-tenant"), "adfs");
    }

    #[test]
    fn test_from_metadata_requires_audience() {
        let mut doc = metadata("https://login.microsoftonline.com/");
        doc.authentication.audiences.clear();
        assert!(Environment::from_metadata("https://management.azure.com/", doc).is_err());
    }

    #[test]
    fn test_aad_keeps_tenant() {
        let env = Environment::from_metadata(
            "https://management.region.contoso.com",
            metadata("https://login.microsoftonline.com/"),
        )
        .expect("valid metadata");
        assert!(!env.is_adfs());
        assert_eq!(env.effective_tenant("my-tenant"), "my-tenant");
    }

    #[test]
    fn test_is_adfs_endpoint() {
        assert!(is_adfs_endpoint("https://adfs.local.azurestack.external/adfs"));
        assert!(is_adfs_endpoint("https://adfs.local.azurestack.external/adfs/"));
        assert!(!is_adfs_endpoint("https://login.microsoftonline.com/"));
        assert!(!is_adfs_endpoint("https://login.microsoftonline.com/adfs-tenant"));
    }

    #[test]
    fn test_storage_suffix_from_arm_url() {
        assert_eq!(
            storage_suffix_from_arm_url("https://management.local.azurestack.external/"),
            "local.azurestack.external"
        );
        assert_eq!(storage_suffix_from_arm_url("http://localhost:8080"), "");
    }
}
