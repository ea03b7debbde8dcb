//! Network resource payloads: virtual networks, subnets, security groups,
//! public IP addresses and network interfaces.

use serde::{Deserialize, Serialize};

/// Reference to another resource by id.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubResource {
    pub id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct VirtualNetwork {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<VirtualNetworkProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    pub address_space: Option<AddressSpace>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Subnet {
    pub id: Option<String>,
    pub name: Option<String>,
    pub properties: Option<SubnetProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    pub address_prefix: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SecurityGroup {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<SecurityGroupProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupProperties {
    #[serde(default)]
    pub security_rules: Vec<SecurityRule>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SecurityRule {
    pub name: Option<String>,
    pub properties: Option<SecurityRuleProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    pub protocol: Option<String>,
    pub destination_port_range: Option<String>,
    pub access: Option<String>,
    pub direction: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PublicIpAddress {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<PublicIpAddressProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(rename = "publicIPAllocationMethod")]
    pub public_ip_allocation_method: Option<String>,
    pub ip_address: Option<String>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NetworkInterface {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub properties: Option<NetworkInterfaceProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,
    pub network_security_group: Option<SubResource>,
    pub provisioning_state: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct IpConfiguration {
    pub name: Option<String>,
    pub properties: Option<IpConfigurationProperties>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(rename = "privateIPAddress")]
    pub private_ip_address: Option<String>,
    #[serde(rename = "privateIPAllocationMethod")]
    pub private_ip_allocation_method: Option<String>,
    pub subnet: Option<SubResource>,
    #[serde(rename = "publicIPAddress")]
    pub public_ip_address: Option<SubResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nic() {
        let nic: NetworkInterface = serde_json::from_str(
            r#"{
                "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/nic1",
                "name": "nic1",
                "properties": {
                    "ipConfigurations": [{
                        "name": "ipConfig1",
                        "properties": {
                            "privateIPAddress": "10.0.0.4",
                            "privateIPAllocationMethod": "Dynamic",
                            "subnet": {"id": "subnet-id"},
                            "publicIPAddress": {"id": "ip-id"}
                        }
                    }],
                    "networkSecurityGroup": {"id": "nsg-id"}
                }
            }"#,
        )
        .expect("parse nic");
        let props = nic.properties.expect("properties");
        let ip = props.ip_configurations[0]
            .properties
            .as_ref()
            .expect("ip properties");
        assert_eq!(ip.private_ip_address.as_deref(), Some("10.0.0.4"));
        assert_eq!(ip.private_ip_allocation_method.as_deref(), Some("Dynamic"));
        assert_eq!(
            ip.public_ip_address.as_ref().and_then(|r| r.id.as_deref()),
            Some("ip-id")
        );
        assert_eq!(
            props.network_security_group.and_then(|r| r.id).as_deref(),
            Some("nsg-id")
        );
    }

    #[test]
    fn test_parse_public_ip() {
        let ip: PublicIpAddress = serde_json::from_str(
            r#"{"name":"ip1","properties":{"publicIPAllocationMethod":"Static","ipAddress":"192.168.102.5"}}"#,
        )
        .expect("parse ip");
        let props = ip.properties.expect("properties");
        assert_eq!(props.public_ip_allocation_method.as_deref(), Some("Static"));
        assert_eq!(props.ip_address.as_deref(), Some("192.168.102.5"));
    }
}
