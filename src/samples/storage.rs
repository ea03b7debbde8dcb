use super::{SampleContext, DELETE_TIMEOUT};
use crate::hybrid::{resources, storage, Result};
use crate::models::StorageAccountKeys;
use crate::output;

pub const RESOURCE_GROUP: &str = "TestGoStorageSampleResourceGroup";
pub const STORAGE_ACCOUNT: &str = "goteststorageacc";
const ACCOUNT_KIND: &str = "Storage";

fn print_keys(keys: &StorageAccountKeys) {
    let line: String = keys
        .keys
        .iter()
        .map(|k| {
            format!(
                "Name: {} Value: {}, ",
                k.key_name.as_deref().unwrap_or_default(),
                k.value.as_deref().unwrap_or_default()
            )
        })
        .collect();
    println!("{line}");
}

/// Storage account lifecycle: name check, create, list, rotate a key and
/// delete.
pub async fn run(ctx: &SampleContext, clean: bool) -> Result<()> {
    let client = &ctx.client;

    output::step("Creating resource group");
    resources::create_resource_group(client, RESOURCE_GROUP, ctx.location()).await?;

    output::step("Checking name availability");
    let availability = storage::check_name_availability(client, STORAGE_ACCOUNT)
        .await
        .map_err(|e| format!("Err checking name availability: {e}"))?;
    println!(
        "The account {STORAGE_ACCOUNT} is available: {}",
        availability.name_available
    );
    if let Some(message) = availability.message.as_deref() {
        println!("Detailed message: {message}");
    }

    output::step("Creating storage account");
    storage::create_storage_account(
        client,
        STORAGE_ACCOUNT,
        RESOURCE_GROUP,
        ctx.location(),
        Some(ACCOUNT_KIND),
    )
    .await?;

    output::step("Printing all storage accounts");
    let accounts = storage::list_storage_accounts(client).await?;
    output::print_names(accounts.iter().filter_map(|a| a.name.as_deref()));

    output::step(&format!("Printing all storage accounts in {RESOURCE_GROUP}"));
    let accounts = storage::list_storage_accounts_by_resource_group(client, RESOURCE_GROUP).await?;
    output::print_names(accounts.iter().filter_map(|a| a.name.as_deref()));

    output::step(&format!("Printing all keys for storage account: {STORAGE_ACCOUNT}"));
    let keys = storage::list_keys(client, RESOURCE_GROUP, STORAGE_ACCOUNT)
        .await
        .map_err(|e| format!("Failed to list keys: {e}"))?;
    print_keys(&keys);

    output::step("Rotating key1");
    storage::regenerate_key(client, RESOURCE_GROUP, STORAGE_ACCOUNT, "key1")
        .await
        .map_err(|e| format!("Failed to regenerate key: {e}"))?;

    output::step(&format!("Printing all keys for storage account: {STORAGE_ACCOUNT}"));
    let keys = storage::list_keys(client, RESOURCE_GROUP, STORAGE_ACCOUNT)
        .await
        .map_err(|e| format!("Failed to list keys: {e}"))?;
    print_keys(&keys);

    output::step("Deleting storage account");
    storage::delete_storage_account(client, RESOURCE_GROUP, STORAGE_ACCOUNT)
        .await
        .map_err(|e| format!("Failed to delete storage account {STORAGE_ACCOUNT}: {e}"))?;

    if clean {
        output::step("Deleting resource group");
        resources::delete_resource_group(client, RESOURCE_GROUP, DELETE_TIMEOUT).await?;
    }
    Ok(())
}
