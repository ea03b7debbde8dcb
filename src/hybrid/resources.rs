//! Resource group operations.

use super::Result;
use crate::azure::ArmClient;
use crate::models::ResourceGroup;
use std::time::Duration;

const ERROR_PREFIX: &str = "Cannot create resource group, reason:";

/// Create (or update) a resource group in `location`.
pub async fn create_resource_group(
    client: &ArmClient,
    name: &str,
    location: &str,
) -> Result<ResourceGroup> {
    let body = ResourceGroup {
        location: location.to_string(),
        ..Default::default()
    };
    let path = client.resource_group_path(name);
    let rg = client
        .put(&path, client.profile().resources, &body)
        .await
        .map_err(|e| format!("{ERROR_PREFIX} {e}"))?;
    log::info!("resource group {name} created in {location}");
    Ok(rg)
}

pub async fn get_resource_group(client: &ArmClient, name: &str) -> Result<ResourceGroup> {
    let path = client.resource_group_path(name);
    Ok(client.get(&path, client.profile().resources).await?)
}

/// All resource groups of the subscription, across pages.
pub async fn list_resource_groups(client: &ArmClient) -> Result<Vec<ResourceGroup>> {
    let path = format!("{}/resourcegroups", client.subscription_path());
    let groups = client
        .list_all(&path, client.profile().resources, &[])
        .await?;
    Ok(groups)
}

/// Delete a resource group and wait at most `timeout` for ARM to finish.
pub async fn delete_resource_group(
    client: &ArmClient,
    name: &str,
    timeout: Duration,
) -> Result<()> {
    let path = client.resource_group_path(name);
    log::info!("deleting resource group {name}");
    client
        .begin_delete(&path, client.profile().resources)
        .await?
        .with_timeout(timeout)
        .poll_until_done()
        .await
        .map_err(|e| format!("Failed to delete resource group {name}: {e}"))?;
    Ok(())
}
