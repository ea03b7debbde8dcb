use super::{SampleContext, DELETE_TIMEOUT};
use crate::hybrid::{keyvault, resources, Result};
use crate::output;

pub const RESOURCE_GROUP: &str = "TestGoKVSampleResourceGroup";
pub const VAULT: &str = "gotestkeyvault";
pub const SECRET_NAME: &str = "testgokey";
const SECRET_VALUE: &str = "testvalue";

async fn print_vaults(ctx: &SampleContext) -> Result<()> {
    output::step("Printing Key Vaults");
    let vaults = keyvault::list_vaults(&ctx.client)
        .await
        .map_err(|e| format!("can't list key vaults: {e}"))?;
    output::print_names(vaults.iter().filter_map(|v| v.name.as_deref()));
    Ok(())
}

/// Vault with a full-access policy for the sample's principal, and a
/// secret written and read back through ARM.
pub async fn run(ctx: &SampleContext, clean: bool) -> Result<()> {
    let client = &ctx.client;

    output::step("Creating resource group");
    resources::create_resource_group(client, RESOURCE_GROUP, ctx.location()).await?;

    print_vaults(ctx).await?;

    output::step("Creating Key Vault");
    keyvault::create_vault_with_full_access(
        client,
        RESOURCE_GROUP,
        VAULT,
        ctx.location(),
        &ctx.admin_tenant_id,
        &ctx.config.object_id,
    )
    .await?;

    print_vaults(ctx).await?;

    output::step("Creating secret in Key Vault");
    keyvault::create_or_update_secret(client, RESOURCE_GROUP, VAULT, SECRET_NAME, SECRET_VALUE)
        .await?;

    output::step("Getting secret from Key Vault");
    let secret = keyvault::get_secret(client, RESOURCE_GROUP, VAULT, SECRET_NAME)
        .await
        .map_err(|e| format!("Err getting secret {e}"))?;
    output::success(&format!(
        "Secret retrieved. Name: {}",
        secret.name.as_deref().unwrap_or(SECRET_NAME)
    ));

    output::step("Deleting Key Vault");
    if let Err(e) = keyvault::delete_vault(client, RESOURCE_GROUP, VAULT).await {
        output::failure(&format!("Failed to delete keyvault {VAULT}: {e}"));
    }

    if clean {
        output::step("Deleting resource group");
        resources::delete_resource_group(client, RESOURCE_GROUP, DELETE_TIMEOUT).await?;
    }
    Ok(())
}
