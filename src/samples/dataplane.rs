use super::{SampleContext, DELETE_TIMEOUT};
use crate::azure::storage_suffix_from_arm_url;
use crate::hybrid::dataplane::ContainerUrl;
use crate::hybrid::{resources, storage, Result};
use crate::output;
use std::path::Path;

pub const RESOURCE_GROUP: &str = "azure-sample-rg";
pub const STORAGE_ACCOUNT: &str = "samplestacc";
pub const CONTAINER: &str = "samplecontainer";
pub const UPLOAD_FILE: &str = "assets/test-upload-file.txt";

/// Delete the sample resource group.
pub async fn clean(ctx: &SampleContext) -> Result<()> {
    output::step(&format!("Deleting resource group '{RESOURCE_GROUP}'..."));
    resources::delete_resource_group(&ctx.client, RESOURCE_GROUP, DELETE_TIMEOUT).await?;
    output::success(&format!("Successfully deleted resource group '{RESOURCE_GROUP}'."));
    Ok(())
}

/// Resource group and storage account through ARM, then a blob upload
/// signed with the account key.
pub async fn run(ctx: &SampleContext, file: &Path) -> Result<()> {
    let client = &ctx.client;
    let location = ctx.location();

    output::step(&format!("Creating resource group '{RESOURCE_GROUP}'..."));
    resources::create_resource_group(client, RESOURCE_GROUP, location).await?;
    output::success(&format!("Successfully created resource group '{RESOURCE_GROUP}'."));

    output::step(&format!("Creating storage account '{STORAGE_ACCOUNT}'..."));
    storage::create_storage_account(client, STORAGE_ACCOUNT, RESOURCE_GROUP, location, None)
        .await?;
    output::success(&format!("Successfully created storage account {STORAGE_ACCOUNT}."));

    output::step("Getting dataplane URL...");
    let key = storage::get_storage_account_key(client, RESOURCE_GROUP, STORAGE_ACCOUNT).await?;
    let suffix = storage_suffix_from_arm_url(&ctx.config.resource_manager_endpoint_url);
    let container = ContainerUrl::new(ctx.http.clone(), STORAGE_ACCOUNT, suffix, CONTAINER, &key)?;
    output::success("Successfully got dataplane URL.");

    output::step(&format!(
        "Uploading '{}' to storage container...",
        file.display()
    ));
    container.upload_file(file).await?;
    output::success(&format!(
        "Successfully uploaded '{}' to storage container...",
        file.display()
    ));
    output::success("Sample completed successfully.");
    Ok(())
}
