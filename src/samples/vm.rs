use super::{SampleContext, DELETE_TIMEOUT};
use crate::hybrid::compute::{self, VmCredentials};
use crate::hybrid::{network, resources, storage, Result};
use crate::output;

pub const RESOURCE_GROUP: &str = "TestGoVMSampleResourceGroup";
const VNET: &str = "TestGoVnetName";
const SUBNET: &str = "TestGoSubnetName";
const NSG: &str = "TestGoNsgName";
const PUBLIC_IP: &str = "TestGoIpAddr";
const NIC: &str = "testGoNetworkInterface";
const STORAGE_ACCOUNT: &str = "govmteststorageacc";
const VM: &str = "TestGoVm1";
const DISK: &str = "osDisk2";
const DISK_SIZE_GB: i32 = 1;
const MANAGED_DISK_VM: &str = "TestGoManagedDiskVm";

const ADMIN_USERNAME: &str = "username";
const DEFAULT_PASSWORD: &str = "Password!23";

async fn print_vms(ctx: &SampleContext) -> Result<()> {
    output::step(&format!("Listing virtual machines in {RESOURCE_GROUP}"));
    let vms = compute::list_vms(&ctx.client, RESOURCE_GROUP)
        .await
        .map_err(|e| format!("can't list virtual machines: {e}"))?;
    output::print_names(vms.iter().filter_map(|vm| vm.name.as_deref()));
    Ok(())
}

/// Network stack, storage account, a VHD-backed VM that is deleted again,
/// then a VM with an attached managed disk.
pub async fn run(ctx: &SampleContext, password: Option<&str>, clean: bool) -> Result<()> {
    let client = &ctx.client;
    let location = ctx.location();
    let creds = VmCredentials {
        username: ADMIN_USERNAME.to_string(),
        password: password.unwrap_or(DEFAULT_PASSWORD).to_string(),
        ..Default::default()
    };

    output::step("Creating resource group");
    resources::create_resource_group(client, RESOURCE_GROUP, location).await?;

    output::step("Creating Vnet and subnets");
    network::create_virtual_network_and_subnets(client, RESOURCE_GROUP, VNET, SUBNET, location)
        .await?;

    output::step("Creating network security group");
    network::create_network_security_group(client, RESOURCE_GROUP, NSG, location).await?;

    output::step("Creating public ip");
    network::create_public_ip(client, RESOURCE_GROUP, PUBLIC_IP, location).await?;

    network::get_virtual_network_subnet(client, RESOURCE_GROUP, VNET, SUBNET)
        .await
        .map_err(|e| format!("Failed to get subnet: {e}"))?;

    output::step("Creating Network Interface");
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

    output::step("Creating storage account");
    storage::put_storage_account(client, STORAGE_ACCOUNT, RESOURCE_GROUP, location, None)
        .await?;

    output::step("Creating Virtual Machine");
    let vhd = compute::vhd_uri(
        STORAGE_ACCOUNT,
        &ctx.environment.storage_endpoint_suffix,
        VM,
    );
    compute::create_vm(
        client,
        RESOURCE_GROUP,
        VM,
        location,
        nic.id.as_deref(),
        &vhd,
        &creds,
    )
    .await?;

    print_vms(ctx).await?;

    output::step("Deleting VM");
    compute::delete_vm(client, RESOURCE_GROUP, VM, DELETE_TIMEOUT).await?;

    output::step("Creating Disk");
    let disk =
        compute::create_managed_disk(client, RESOURCE_GROUP, DISK, location, DISK_SIZE_GB).await?;

    output::step("Creating Managed Disk VM");
    compute::create_vm_with_managed_disk(
        client,
        RESOURCE_GROUP,
        MANAGED_DISK_VM,
        location,
        nic.id.as_deref(),
        DISK,
        disk.id.as_deref(),
        &creds,
    )
    .await?;

    print_vms(ctx).await?;

    if clean {
        output::step("Deleting resource group");
        resources::delete_resource_group(client, RESOURCE_GROUP, DELETE_TIMEOUT)
            .await
            .map_err(|e| format!("Timed out when deleting resource group: {e}"))?;
    }
    Ok(())
}
