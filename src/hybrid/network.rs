//! Virtual network, security group, public IP and network interface
//! operations.

use super::Result;
use crate::azure::ArmClient;
use crate::models::{NetworkInterface, PublicIpAddress, SecurityGroup, Subnet, VirtualNetwork};
use serde_json::{json, Value};

pub const VNET_ADDRESS_PREFIX: &str = "10.0.0.0/8";
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/16";

const VIRTUAL_NETWORKS: &str = "Microsoft.Network/virtualNetworks";
const SECURITY_GROUPS: &str = "Microsoft.Network/networkSecurityGroups";
const PUBLIC_IPS: &str = "Microsoft.Network/publicIPAddresses";
const NETWORK_INTERFACES: &str = "Microsoft.Network/networkInterfaces";

fn error_message(resource: &str, reason: impl std::fmt::Display) -> String {
    format!("Cannot create {resource}, reason: {reason}")
}

pub fn virtual_network_body(location: &str, subnet_name: &str) -> Value {
    json!({
        "location": location,
        "properties": {
            "addressSpace": { "addressPrefixes": [VNET_ADDRESS_PREFIX] },
            "subnets": [{
                "name": subnet_name,
                "properties": { "addressPrefix": SUBNET_ADDRESS_PREFIX }
            }]
        }
    })
}

fn allow_inbound_tcp(name: &str, port: &str, priority: i32) -> Value {
    json!({
        "name": name,
        "properties": {
            "protocol": "Tcp",
            "sourceAddressPrefix": "0.0.0.0/0",
            "sourcePortRange": "1-65535",
            "destinationAddressPrefix": "0.0.0.0/0",
            "destinationPortRange": port,
            "access": "Allow",
            "direction": "Inbound",
            "priority": priority
        }
    })
}

/// Security group allowing inbound SSH and HTTPS from anywhere.
pub fn security_group_body(location: &str) -> Value {
    json!({
        "location": location,
        "properties": {
            "securityRules": [
                allow_inbound_tcp("allow_ssh", "22", 100),
                allow_inbound_tcp("allow_https", "443", 200),
            ]
        }
    })
}

pub fn public_ip_body(name: &str, location: &str) -> Value {
    json!({
        "name": name,
        "location": location,
        "properties": { "publicIPAllocationMethod": "Static" }
    })
}

pub fn network_interface_body(
    location: &str,
    nsg_id: Option<&str>,
    subnet_id: Option<&str>,
    ip_id: Option<&str>,
) -> Value {
    json!({
        "location": location,
        "properties": {
            "networkSecurityGroup": { "id": nsg_id },
            "ipConfigurations": [{
                "name": "ipConfig1",
                "properties": {
                    "subnet": { "id": subnet_id },
                    "privateIPAllocationMethod": "Dynamic",
                    "publicIPAddress": { "id": ip_id }
                }
            }]
        }
    })
}

/// Create a virtual network with one subnet and wait for it.
pub async fn create_virtual_network_and_subnets(
    client: &ArmClient,
    rg: &str,
    vnet_name: &str,
    subnet_name: &str,
    location: &str,
) -> Result<VirtualNetwork> {
    let resource = "virtual network";
    let path = client.provider_path(rg, VIRTUAL_NETWORKS, vnet_name);
    let body = virtual_network_body(location, subnet_name);
    let poller = client
        .begin_put(&path, client.profile().network, &body)
        .await
        .map_err(|e| error_message(resource, e))?;
    let vnet = poller.wait().await.map_err(|e| {
        error_message(
            resource,
            format!("cannot get the vnet create or update future response: {e}"),
        )
    })?;
    log::info!("virtual network {vnet_name} with subnet {subnet_name} created");
    Ok(vnet)
}

pub async fn create_network_security_group(
    client: &ArmClient,
    rg: &str,
    nsg_name: &str,
    location: &str,
) -> Result<SecurityGroup> {
    let resource = "security group";
    let path = client.provider_path(rg, SECURITY_GROUPS, nsg_name);
    let poller = client
        .begin_put(&path, client.profile().network, &security_group_body(location))
        .await
        .map_err(|e| error_message(resource, e))?;
    let nsg = poller.wait().await.map_err(|e| {
        error_message(
            resource,
            format!("cannot get nsg create or update future response: {e}"),
        )
    })?;
    log::info!("network security group {nsg_name} created");
    Ok(nsg)
}

pub async fn create_public_ip(
    client: &ArmClient,
    rg: &str,
    ip_name: &str,
    location: &str,
) -> Result<PublicIpAddress> {
    let resource = "public IP address";
    let path = client.provider_path(rg, PUBLIC_IPS, ip_name);
    let poller = client
        .begin_put(&path, client.profile().network, &public_ip_body(ip_name, location))
        .await
        .map_err(|e| error_message(resource, e))?;
    let ip = poller.wait().await.map_err(|e| {
        error_message(
            resource,
            format!("cannot get public ip address create or update future response: {e}"),
        )
    })?;
    log::info!("public ip {ip_name} created");
    Ok(ip)
}

/// Create a NIC wired to an existing security group, subnet and public IP.
#[allow(clippy::too_many_arguments)]
pub async fn create_network_interface(
    client: &ArmClient,
    rg: &str,
    nic_name: &str,
    nsg_name: &str,
    vnet_name: &str,
    subnet_name: &str,
    ip_name: &str,
    location: &str,
) -> Result<NetworkInterface> {
    let resource = "network interface";
    let nsg = get_network_security_group(client, rg, nsg_name)
        .await
        .map_err(|e| error_message(resource, format!("failed to get network security group: {e}")))?;
    let subnet = get_virtual_network_subnet(client, rg, vnet_name, subnet_name)
        .await
        .map_err(|e| error_message(resource, format!("failed to get subnet: {e}")))?;
    let ip = get_public_ip(client, rg, ip_name)
        .await
        .map_err(|e| error_message(resource, format!("failed to get ip address: {e}")))?;

    let body = network_interface_body(
        location,
        nsg.id.as_deref(),
        subnet.id.as_deref(),
        ip.id.as_deref(),
    );
    let path = client.provider_path(rg, NETWORK_INTERFACES, nic_name);
    let poller = client
        .begin_put(&path, client.profile().network, &body)
        .await
        .map_err(|e| error_message(resource, e))?;
    let nic = poller.wait().await.map_err(|e| {
        error_message(
            resource,
            format!("cannot get nic create or update future response: {e}"),
        )
    })?;
    log::info!("network interface {nic_name} created");
    Ok(nic)
}

pub async fn get_network_security_group(
    client: &ArmClient,
    rg: &str,
    nsg_name: &str,
) -> Result<SecurityGroup> {
    let path = client.provider_path(rg, SECURITY_GROUPS, nsg_name);
    Ok(client.get(&path, client.profile().network).await?)
}

pub async fn get_virtual_network_subnet(
    client: &ArmClient,
    rg: &str,
    vnet_name: &str,
    subnet_name: &str,
) -> Result<Subnet> {
    let path = format!(
        "{}/subnets/{subnet_name}",
        client.provider_path(rg, VIRTUAL_NETWORKS, vnet_name)
    );
    Ok(client.get(&path, client.profile().network).await?)
}

pub async fn get_public_ip(client: &ArmClient, rg: &str, ip_name: &str) -> Result<PublicIpAddress> {
    let path = client.provider_path(rg, PUBLIC_IPS, ip_name);
    Ok(client.get(&path, client.profile().network).await?)
}

pub async fn get_nic(client: &ArmClient, rg: &str, nic_name: &str) -> Result<NetworkInterface> {
    let path = client.provider_path(rg, NETWORK_INTERFACES, nic_name);
    Ok(client.get(&path, client.profile().network).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_network_body() {
        let body = virtual_network_body("local", "subnet1");
        assert_eq!(
            body["properties"]["addressSpace"]["addressPrefixes"][0],
            "10.0.0.0/8"
        );
        assert_eq!(body["properties"]["subnets"][0]["name"], "subnet1");
        assert_eq!(
            body["properties"]["subnets"][0]["properties"]["addressPrefix"],
            "10.0.0.0/16"
        );
    }

    #[test]
    fn test_security_group_rules() {
        let body = security_group_body("local");
        let rules = body["properties"]["securityRules"]
            .as_array()
            .expect("rules array");
        assert_eq!(rules.len(), 2);

        let ssh = &rules[0];
        assert_eq!(ssh["name"], "allow_ssh");
        assert_eq!(ssh["properties"]["destinationPortRange"], "22");
        assert_eq!(ssh["properties"]["priority"], 100);

        let https = &rules[1];
        assert_eq!(https["name"], "allow_https");
        assert_eq!(https["properties"]["destinationPortRange"], "443");
        assert_eq!(https["properties"]["priority"], 200);

        for rule in rules {
            let p = &rule["properties"];
            assert_eq!(p["protocol"], "Tcp");
            assert_eq!(p["direction"], "Inbound");
            assert_eq!(p["access"], "Allow");
            assert_eq!(p["sourceAddressPrefix"], "0.0.0.0/0");
            assert_eq!(p["sourcePortRange"], "1-65535");
            assert_eq!(p["destinationAddressPrefix"], "0.0.0.0/0");
        }
    }

    #[test]
    fn test_public_ip_is_static() {
        let body = public_ip_body("ip1", "local");
        assert_eq!(body["properties"]["publicIPAllocationMethod"], "Static");
        assert_eq!(body["name"], "ip1");
    }

    #[test]
    fn test_network_interface_body() {
        let body = network_interface_body("local", Some("nsg-id"), Some("subnet-id"), Some("ip-id"));
        let ip_config = &body["properties"]["ipConfigurations"][0];
        assert_eq!(ip_config["name"], "ipConfig1");
        assert_eq!(ip_config["properties"]["privateIPAllocationMethod"], "Dynamic");
        assert_eq!(ip_config["properties"]["subnet"]["id"], "subnet-id");
        assert_eq!(ip_config["properties"]["publicIPAddress"]["id"], "ip-id");
        assert_eq!(body["properties"]["networkSecurityGroup"]["id"], "nsg-id");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message("virtual network", "boom"),
            "Cannot create virtual network, reason: boom"
        );
    }
}
