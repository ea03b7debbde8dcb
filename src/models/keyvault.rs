//! Key vault and secret payloads.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Vault {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<VaultProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VaultProperties {
    pub tenant_id: Option<String>,
    pub vault_uri: Option<String>,
    #[serde(default)]
    pub access_policies: Vec<AccessPolicyEntry>,
    pub enabled_for_deployment: Option<bool>,
    pub enabled_for_template_deployment: Option<bool>,
    pub enabled_for_disk_encryption: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicyEntry {
    pub tenant_id: Option<String>,
    pub object_id: Option<String>,
    pub permissions: Option<Permissions>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Permissions {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
    #[serde(default)]
    pub storage: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Secret {
    pub id: Option<String>,
    pub name: Option<String>,
    pub properties: Option<SecretProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecretProperties {
    pub value: Option<String>,
    pub content_type: Option<String>,
    pub secret_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vault() {
        let vault: Vault = serde_json::from_str(
            r#"{"name":"kv1","properties":{"tenantId":"2e7a6e3c-0b11-4c25-9a88-6f0fd3a1ac0e",
                "vaultUri":"https://kv1.vault.local.azurestack.external/",
                "accessPolicies":[{"tenantId":"t","objectId":"o","permissions":{"secrets":["all"],"keys":["all"]}}]}}"#,
        )
        .expect("parse vault");
        let props = vault.properties.expect("properties");
        assert_eq!(props.access_policies.len(), 1);
        let perms = props.access_policies[0]
            .permissions
            .as_ref()
            .expect("permissions");
        assert_eq!(perms.secrets, vec!["all".to_string()]);
        assert!(perms.storage.is_empty());
    }
}
