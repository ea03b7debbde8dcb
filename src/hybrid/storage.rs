//! Storage account operations.

use super::Result;
use crate::azure::{ArmClient, PROVISIONING_TIMEOUT};
use crate::models::{CheckNameAvailabilityResult, StorageAccount, StorageAccountKeys};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

const STORAGE_ACCOUNTS: &str = "Microsoft.Storage/storageAccounts";
const ERROR_PREFIX: &str = "Cannot create storage account, reason:";

/// Storage account names are 3 to 24 lowercase letters and digits.
pub fn is_valid_account_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[a-z0-9]{3,24}$").expect("valid regex"));
    re.is_match(name)
}

pub fn storage_account_body(location: &str, kind: Option<&str>) -> Value {
    let mut body = json!({
        "sku": { "name": "Standard_LRS" },
        "location": location,
        "properties": {}
    });
    if let Some(kind) = kind {
        body["kind"] = json!(kind);
    }
    body
}

fn account_path(client: &ArmClient, rg: &str, name: &str) -> String {
    client.provider_path(rg, STORAGE_ACCOUNTS, name)
}

pub async fn check_name_availability(
    client: &ArmClient,
    name: &str,
) -> Result<CheckNameAvailabilityResult> {
    let path = format!(
        "{}/providers/Microsoft.Storage/checkNameAvailability",
        client.subscription_path()
    );
    let body = json!({ "name": name, "type": STORAGE_ACCOUNTS });
    Ok(client
        .post(&path, client.profile().storage, Some(&body))
        .await?)
}

/// Create a `Standard_LRS` account after making sure the name is free.
pub async fn create_storage_account(
    client: &ArmClient,
    name: &str,
    rg: &str,
    location: &str,
    kind: Option<&str>,
) -> Result<StorageAccount> {
    check_account_name(name)?;
    let availability = check_name_availability(client, name)
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    if !availability.name_available {
        log::warn!(
            "storage account name {name} taken: {}",
            availability.message.as_deref().unwrap_or_default()
        );
        return Err(format!("{ERROR_PREFIX} storage account name [{name}] not available").into());
    }
    put_storage_account(client, name, rg, location, kind).await
}

/// Create or update a `Standard_LRS` account without the name check, so an
/// account the caller already owns is accepted.
pub async fn put_storage_account(
    client: &ArmClient,
    name: &str,
    rg: &str,
    location: &str,
    kind: Option<&str>,
) -> Result<StorageAccount> {
    check_account_name(name)?;
    let path = account_path(client, rg, name);
    let poller = client
        .begin_put(
            &path,
            client.profile().storage,
            &storage_account_body(location, kind),
        )
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    let account = poller
        .with_timeout(PROVISIONING_TIMEOUT)
        .wait()
        .await
        .map_err(|e| {
            format!("{ERROR_PREFIX} cannot get the storage account create future response: {e}")
        })?;
    log::info!("storage account {name} created");
    Ok(account)
}

fn check_account_name(name: &str) -> Result<()> {
    if !is_valid_account_name(name) {
        return Err(format!(
            "{ERROR_PREFIX} storage account name [{name}] must be 3-24 lowercase letters or digits"
        )
        .into());
    }
    Ok(())
}

/// All storage accounts of the subscription.
pub async fn list_storage_accounts(client: &ArmClient) -> Result<Vec<StorageAccount>> {
    let path = format!("{}/providers/{STORAGE_ACCOUNTS}", client.subscription_path());
    Ok(client.list_all(&path, client.profile().storage, &[]).await?)
}

pub async fn list_storage_accounts_by_resource_group(
    client: &ArmClient,
    rg: &str,
) -> Result<Vec<StorageAccount>> {
    let path = format!(
        "{}/providers/{STORAGE_ACCOUNTS}",
        client.resource_group_path(rg)
    );
    Ok(client.list_all(&path, client.profile().storage, &[]).await?)
}

pub async fn list_keys(client: &ArmClient, rg: &str, name: &str) -> Result<StorageAccountKeys> {
    let path = format!("{}/listKeys", account_path(client, rg, name));
    Ok(client
        .post::<(), _>(&path, client.profile().storage, None)
        .await?)
}

/// Regenerate `key_name` (`key1` or `key2`) and return the new key set.
pub async fn regenerate_key(
    client: &ArmClient,
    rg: &str,
    name: &str,
    key_name: &str,
) -> Result<StorageAccountKeys> {
    let path = format!("{}/regenerateKey", account_path(client, rg, name));
    let body = json!({ "keyName": key_name });
    Ok(client
        .post(&path, client.profile().storage, Some(&body))
        .await?)
}

pub async fn delete_storage_account(client: &ArmClient, rg: &str, name: &str) -> Result<()> {
    let path = account_path(client, rg, name);
    client.delete(&path, client.profile().storage).await?;
    log::info!("storage account {name} deleted");
    Ok(())
}

/// First access key of the account, as the data plane uses it.
pub async fn get_storage_account_key(client: &ArmClient, rg: &str, name: &str) -> Result<String> {
    let keys = list_keys(client, rg, name)
        .await
        .map_err(|e| format!("cannot list storage account keys: {e}"))?;
    keys.keys
        .into_iter()
        .next()
        .and_then(|k| k.value)
        .ok_or_else(|| format!("storage account {name} has no keys").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_account_name() {
        assert!(is_valid_account_name("samplestacc"));
        assert!(is_valid_account_name("abc"));
        assert!(is_valid_account_name("disksamplestacc2024"));
        assert!(!is_valid_account_name("ab"));
        assert!(!is_valid_account_name("SampleStAcc"));
        assert!(!is_valid_account_name("sample-st-acc"));
        assert!(!is_valid_account_name("a123456789012345678901234"));
    }

    #[test]
    fn test_storage_account_body() {
        let body = storage_account_body("local", Some("Storage"));
        assert_eq!(body["sku"]["name"], "Standard_LRS");
        assert_eq!(body["kind"], "Storage");
        assert_eq!(body["location"], "local");

        let body = storage_account_body("local", None);
        assert!(body.get("kind").is_none());
    }
}
