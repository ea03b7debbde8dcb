use super::{SampleContext, DELETE_TIMEOUT};
use crate::hybrid::compute::{self, VmCredentials};
use crate::hybrid::{network, resources, storage, Result};
use crate::output;

pub const RESOURCE_GROUP: &str = "azure-sample-golang-manageddisk";
const VM: &str = "az-samples-go-vmname";
const NIC: &str = "nic1";
pub const USERNAME: &str = "VMAdmin";
const VNET: &str = "vnet1";
const SUBNET: &str = "subnet1";
const NSG: &str = "nsg1";
const PUBLIC_IP: &str = "ip1";
const STORAGE_ACCOUNT: &str = "disksamplestacc";
const DISK: &str = "sampledisk";
const DISK_SIZE_GB: i32 = 1;

/// Delete the sample resource group.
pub async fn clean(ctx: &SampleContext) -> Result<()> {
    output::step(&format!("Deleting resource group '{RESOURCE_GROUP}'..."));
    resources::delete_resource_group(&ctx.client, RESOURCE_GROUP, DELETE_TIMEOUT).await?;
    output::success(&format!("Successfully deleted resource group '{RESOURCE_GROUP}'."));
    Ok(())
}

/// Network stack and storage account, then an empty managed disk attached
/// to a new VM.
pub async fn run(ctx: &SampleContext, creds: &VmCredentials) -> Result<()> {
    let client = &ctx.client;
    let location = ctx.location();

    output::step(&format!("Creating resource group '{RESOURCE_GROUP}'..."));
    resources::create_resource_group(client, RESOURCE_GROUP, location).await?;
    output::success(&format!("Successfully created resource group '{RESOURCE_GROUP}'."));

    output::step(&format!(
        "Creating virtual network '{VNET}' and subnet '{SUBNET}'..."
    ));
    network::create_virtual_network_and_subnets(client, RESOURCE_GROUP, VNET, SUBNET, location)
        .await?;
    output::success(&format!(
        "Successfully created virtual network '{VNET}' and subnet '{SUBNET}'."
    ));

    output::step(&format!("Creating network security group '{NSG}'..."));
    network::create_network_security_group(client, RESOURCE_GROUP, NSG, location).await?;
    output::success(&format!("Successfully created network security group '{NSG}'."));

    output::step(&format!("Creating public ip '{PUBLIC_IP}'..."));
    network::create_public_ip(client, RESOURCE_GROUP, PUBLIC_IP, location).await?;
    output::success(&format!("Successfully created public ip '{PUBLIC_IP}'."));

    output::step(&format!("Creating network interface '{NIC}'..."));
    let nic = network::create_network_interface(
        client,
        RESOURCE_GROUP,
        NIC,
        NSG,
        VNET,
        SUBNET,
        PUBLIC_IP,
        location,
    )
    .await?;
    output::success(&format!("Successfully created network interface '{NIC}'."));

    output::step(&format!("Creating storage account '{STORAGE_ACCOUNT}'..."));
    storage::create_storage_account(client, STORAGE_ACCOUNT, RESOURCE_GROUP, location, None)
        .await?;
    output::success(&format!(
        "Successfully created storage account '{STORAGE_ACCOUNT}'."
    ));

    output::step(&format!("Creating managed disk '{DISK}'..."));
    let disk =
        compute::create_managed_disk(client, RESOURCE_GROUP, DISK, location, DISK_SIZE_GB).await?;
    output::success(&format!("Successfully created managed disk '{DISK}'."));

    output::step(&format!("Creating vm '{VM}'..."));
    compute::create_vm_with_managed_disk(
        client,
        RESOURCE_GROUP,
        VM,
        location,
        nic.id.as_deref(),
        DISK,
        disk.id.as_deref(),
        creds,
    )
    .await?;
    output::success(&format!("Successfully created vm '{VM}'."));
    output::success("Sample completed successfully.");
    Ok(())
}
