//! Key vault and vault secret operations, all through ARM.

use super::Result;
use crate::azure::{ArmClient, GENERIC_RESOURCES_API_VERSION};
use crate::models::{GenericResource, Secret, Vault};
use serde_json::{json, Value};
use uuid::Uuid;

const VAULTS: &str = "Microsoft.KeyVault/vaults";
const ERROR_PREFIX: &str = "Cannot create key vault, reason:";

/// Permission sets granted by an access policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    pub keys: Vec<&'static str>,
    pub secrets: Vec<&'static str>,
    pub certificates: Vec<&'static str>,
    pub storage: Vec<&'static str>,
}

impl Permissions {
    pub fn full_access() -> Self {
        Permissions {
            keys: vec!["all"],
            secrets: vec!["all"],
            certificates: vec!["all"],
            storage: vec!["all"],
        }
    }
}

fn parse_tenant(tenant_id: &str) -> Result<Uuid> {
    Uuid::parse_str(tenant_id)
        .map_err(|e| format!("{ERROR_PREFIX} tenant id [{tenant_id}] is not a UUID: {e}").into())
}

pub fn access_policy(tenant: &Uuid, object_id: &str, permissions: &Permissions) -> Value {
    let mut perms = json!({
        "keys": permissions.keys,
        "secrets": permissions.secrets,
    });
    if !permissions.certificates.is_empty() {
        perms["certificates"] = json!(permissions.certificates);
    }
    if !permissions.storage.is_empty() {
        perms["storage"] = json!(permissions.storage);
    }
    json!({
        "tenantId": tenant.to_string(),
        "objectId": object_id,
        "permissions": perms
    })
}

/// Standard A-family vault body; `flags` are merged into `properties`.
pub fn vault_body(location: &str, tenant: &Uuid, policies: Vec<Value>, flags: Value) -> Value {
    let mut properties = json!({
        "tenantId": tenant.to_string(),
        "sku": { "family": "A", "name": "standard" },
        "accessPolicies": policies
    });
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), flags.as_object()) {
        for (k, v) in extra {
            props.insert(k.clone(), v.clone());
        }
    }
    json!({ "location": location, "properties": properties })
}

fn vault_path(client: &ArmClient, rg: &str, name: &str) -> String {
    client.provider_path(rg, VAULTS, name)
}

async fn put_vault(client: &ArmClient, rg: &str, name: &str, body: &Value) -> Result<Vault> {
    let path = vault_path(client, rg, name);
    let poller = client
        .begin_put(&path, client.profile().keyvault, body)
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    let vault = poller
        .wait()
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    log::info!("key vault {name} created or updated");
    Ok(vault)
}

/// Vault with no access policies.
pub async fn create_vault(
    client: &ArmClient,
    rg: &str,
    name: &str,
    location: &str,
    tenant_id: &str,
) -> Result<Vault> {
    let tenant = parse_tenant(tenant_id)?;
    put_vault(client, rg, name, &vault_body(location, &tenant, vec![], json!({}))).await
}

/// Vault letting `object_id` create keys and set secrets. The policy is
/// skipped when `object_id` is empty.
pub async fn create_vault_with_policies(
    client: &ArmClient,
    rg: &str,
    name: &str,
    location: &str,
    tenant_id: &str,
    object_id: &str,
) -> Result<Vault> {
    let tenant = parse_tenant(tenant_id)?;
    let mut policies = vec![];
    if !object_id.is_empty() {
        let perms = Permissions {
            keys: vec!["create"],
            secrets: vec!["set"],
            ..Default::default()
        };
        policies.push(access_policy(&tenant, object_id, &perms));
    }
    let body = vault_body(
        location,
        &tenant,
        policies,
        json!({ "enabledForDiskEncryption": true }),
    );
    put_vault(client, rg, name, &body).await
}

/// Grant `object_id` key get/list/create and secret get/list.
pub async fn set_vault_permissions(
    client: &ArmClient,
    rg: &str,
    name: &str,
    location: &str,
    tenant_id: &str,
    object_id: &str,
) -> Result<Vault> {
    let tenant = parse_tenant(tenant_id)?;
    let perms = Permissions {
        keys: vec!["get", "list", "create"],
        secrets: vec!["get", "list"],
        ..Default::default()
    };
    let body = vault_body(
        location,
        &tenant,
        vec![access_policy(&tenant, object_id, &perms)],
        json!({}),
    );
    put_vault(client, rg, name, &body).await
}

/// Open the vault to VM and template deployments.
pub async fn set_vault_deployment_permission(
    client: &ArmClient,
    rg: &str,
    name: &str,
    location: &str,
    tenant_id: &str,
    object_id: &str,
) -> Result<Vault> {
    let tenant = parse_tenant(tenant_id)?;
    let perms = Permissions {
        keys: vec!["get", "list", "create"],
        secrets: vec!["get", "set", "list"],
        ..Default::default()
    };
    let body = vault_body(
        location,
        &tenant,
        vec![access_policy(&tenant, object_id, &perms)],
        json!({
            "enabledForDeployment": true,
            "enabledForTemplateDeployment": true
        }),
    );
    put_vault(client, rg, name, &body).await
}

/// Vault granting `object_id` every permission on keys, secrets,
/// certificates and storage.
pub async fn create_vault_with_full_access(
    client: &ArmClient,
    rg: &str,
    name: &str,
    location: &str,
    tenant_id: &str,
    object_id: &str,
) -> Result<Vault> {
    let tenant = parse_tenant(tenant_id)?;
    let body = vault_body(
        location,
        &tenant,
        vec![access_policy(&tenant, object_id, &Permissions::full_access())],
        json!({}),
    );
    put_vault(client, rg, name, &body).await
}

pub async fn get_vault(client: &ArmClient, rg: &str, name: &str) -> Result<Vault> {
    let path = vault_path(client, rg, name);
    Ok(client.get(&path, client.profile().keyvault).await?)
}

/// Every vault of the subscription, from the generic resource list.
pub async fn list_vaults(client: &ArmClient) -> Result<Vec<GenericResource>> {
    let path = format!("{}/resources", client.subscription_path());
    let filter = format!("resourceType eq '{VAULTS}'");
    Ok(client
        .list_all(&path, GENERIC_RESOURCES_API_VERSION, &[("$filter", filter.as_str())])
        .await?)
}

pub async fn list_vaults_by_resource_group(client: &ArmClient, rg: &str) -> Result<Vec<Vault>> {
    let path = format!("{}/providers/{VAULTS}", client.resource_group_path(rg));
    Ok(client.list_all(&path, client.profile().keyvault, &[]).await?)
}

pub async fn delete_vault(client: &ArmClient, rg: &str, name: &str) -> Result<()> {
    let path = vault_path(client, rg, name);
    client.delete(&path, client.profile().keyvault).await?;
    log::info!("key vault {name} deleted");
    Ok(())
}

fn secret_path(client: &ArmClient, rg: &str, vault: &str, name: &str) -> String {
    format!("{}/secrets/{name}", vault_path(client, rg, vault))
}

pub async fn create_or_update_secret(
    client: &ArmClient,
    rg: &str,
    vault: &str,
    name: &str,
    value: &str,
) -> Result<Secret> {
    let path = secret_path(client, rg, vault, name);
    let body = json!({ "properties": { "value": value } });
    let secret = client
        .put(&path, client.profile().keyvault, &body)
        .await
        .map_err(|e| format!("Cannot create secret {name}, reason: {e}"))?;
    Ok(secret)
}

pub async fn get_secret(client: &ArmClient, rg: &str, vault: &str, name: &str) -> Result<Secret> {
    let path = secret_path(client, rg, vault, name);
    Ok(client.get(&path, client.profile().keyvault).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TENANT: &str = "2e7a6e3c-0b11-4c25-9a88-6f0fd3a1ac0e";

    #[test]
    fn test_parse_tenant() {
        assert!(parse_tenant(TENANT).is_ok());
        let err = parse_tenant("adfs").expect_err("not a uuid");
        assert!(err.to_string().starts_with("Cannot create key vault, reason:"));
    }

    #[test]
    fn test_full_access_policy() {
        let tenant = parse_tenant(TENANT).expect("uuid");
        let policy = access_policy(&tenant, "object-1", &Permissions::full_access());
        assert_eq!(policy["tenantId"], TENANT);
        assert_eq!(policy["objectId"], "object-1");
        for kind in ["keys", "secrets", "certificates", "storage"] {
            assert_eq!(policy["permissions"][kind], json!(["all"]));
        }
    }

    #[test]
    fn test_limited_policy_omits_empty_sets() {
        let tenant = parse_tenant(TENANT).expect("uuid");
        let perms = Permissions {
            keys: vec!["create"],
            secrets: vec!["set"],
            ..Default::default()
        };
        let policy = access_policy(&tenant, "o", &perms);
        assert_eq!(policy["permissions"]["keys"], json!(["create"]));
        assert!(policy["permissions"].get("certificates").is_none());
    }

    #[test]
    fn test_vault_body_merges_flags() {
        let tenant = parse_tenant(TENANT).expect("uuid");
        let body = vault_body(
            "local",
            &tenant,
            vec![],
            json!({"enabledForDeployment": true, "enabledForTemplateDeployment": true}),
        );
        assert_eq!(body["location"], "local");
        assert_eq!(body["properties"]["sku"]["family"], "A");
        assert_eq!(body["properties"]["sku"]["name"], "standard");
        assert_eq!(body["properties"]["enabledForDeployment"], true);
        assert_eq!(body["properties"]["enabledForTemplateDeployment"], true);
        assert_eq!(body["properties"]["accessPolicies"], json!([]));
    }
}
