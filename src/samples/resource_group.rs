use super::{SampleContext, DELETE_TIMEOUT};
use crate::hybrid::resources;
use crate::hybrid::Result;
use crate::output;

pub const RESOURCE_GROUP: &str = "TestGoSampleResourceGroup";

/// Create a resource group, read it back, list all groups and delete it
/// when `clean` is set.
pub async fn run(ctx: &SampleContext, clean: bool) -> Result<()> {
    let client = &ctx.client;

    output::step("Creating resource group");
    resources::create_resource_group(client, RESOURCE_GROUP, ctx.location()).await?;

    resources::get_resource_group(client, RESOURCE_GROUP)
        .await
        .map_err(|e| format!("no resource group found: {e}"))?;

    output::step("Listing Resource Groups");
    let groups = resources::list_resource_groups(client)
        .await
        .map_err(|e| format!("can't list resource groups: {e}"))?;
    output::print_names(groups.iter().filter_map(|g| g.name.as_deref()));

    if clean {
        output::step(&format!("Deleting resource group '{RESOURCE_GROUP}'..."));
        resources::delete_resource_group(client, RESOURCE_GROUP, DELETE_TIMEOUT).await?;
        output::success(&format!("Successfully deleted resource group '{RESOURCE_GROUP}'."));
    }
    Ok(())
}
