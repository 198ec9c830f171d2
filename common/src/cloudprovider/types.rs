//! Value types passed across the provider interface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub url: String,
    pub account: String,
    pub secret: String,
}

/// Connection details the platform stores for an account; rendered into an
/// environment file by `get_client_rc`.
#[derive(Debug, Clone, Default)]
pub struct ProviderInfo {
    pub name: String,
    pub url: String,
    pub account: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudaccountCredential {
    pub username: String,
    pub password: String,
    pub auth_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloudaccount {
    pub access_url: String,
    pub account: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAccount {
    pub account: String,
    pub name: String,
    pub health_status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeographicInfo {
    pub latitude: f32,
    pub longitude: f32,
    pub city: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    Linux,
    Windows,
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsType::Linux => write!(f, "Linux"),
            OsType::Windows => write!(f, "Windows"),
        }
    }
}

impl std::str::FromStr for OsType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(OsType::Linux),
            "windows" => Ok(OsType::Windows),
            _ => anyhow::bail!("Unknown os type: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    System,
    Customized,
    Shared,
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageType::System => write!(f, "system"),
            ImageType::Customized => write!(f, "customized"),
            ImageType::Shared => write!(f, "shared"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicScope {
    System,
    Domain,
    Project,
}

impl std::fmt::Display for PublicScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicScope::System => write!(f, "system"),
            PublicScope::Domain => write!(f, "domain"),
            PublicScope::Project => write!(f, "project"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteTableType {
    System,
    Custom,
}

impl std::fmt::Display for RouteTableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteTableType::System => write!(f, "System"),
            RouteTableType::Custom => write!(f, "Custom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteTableAssociationType {
    Subnet,
    Router,
}

impl RouteTableAssociationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTableAssociationType::Subnet => "Subnet",
            RouteTableAssociationType::Router => "Router",
        }
    }
}

impl std::fmt::Display for RouteTableAssociationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RouteTableAssociationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Subnet" => Ok(RouteTableAssociationType::Subnet),
            "Router" => Ok(RouteTableAssociationType::Router),
            _ => anyhow::bail!("Unknown association type: {}", s),
        }
    }
}

/// Binding between a route table and the subnet or router it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableAssociation {
    pub association_id: String,
    pub association_type: RouteTableAssociationType,
    pub associated_resource_id: String,
}

impl RouteTableAssociation {
    pub fn global_id(&self) -> &str {
        &self.association_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSet {
    pub route_id: String,
    pub destination: String,
    pub next_hop_type: String,
    pub next_hop: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteInterface {
    pub network_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTableCreateOptions {
    pub name: String,
    pub vpc_id: String,
    pub network_id: String,
    pub desc: String,
}

#[derive(Debug, Clone, Default)]
pub struct DiskInfo {
    pub storage_type: String,
    pub storage_external_id: String,
    pub size_gb: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct VmCreateConfig {
    pub name: String,
    pub hostname: String,
    pub description: String,
    pub external_image_id: String,
    pub os_type: String,
    pub sys_disk: DiskInfo,
    pub data_disks: Vec<DiskInfo>,
    pub cpu: i64,
    pub memory_mb: i64,
    pub instance_type: String,
    pub external_network_id: String,
    pub external_vpc_id: String,
    pub ip_addr: String,
    pub account: String,
    pub password: String,
    pub public_key: String,
    pub external_secgroup_id: String,
    pub user_data: String,
    pub project_id: String,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RebuildRootConfig {
    pub image_id: String,
    pub account: String,
    pub password: String,
    pub public_key: String,
    pub sys_size_gb: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeConfig {
    pub cpu: i64,
    pub memory_mb: i64,
    pub instance_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct ServerStopOptions {
    pub is_force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VncInfo {
    pub url: String,
    pub protocol: String,
    pub instance_id: String,
    pub hypervisor: String,
}

#[derive(Debug, Clone, Default)]
pub struct DiskCreateConfig {
    pub name: String,
    pub size_gb: i64,
    pub desc: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssociateConfig {
    pub instance_id: String,
    pub associate_type: String,
    pub bandwidth: i64,
}

#[derive(Debug, Clone, Default)]
pub struct EipCreateOptions {
    pub name: String,
    pub ip: String,
    pub network_external_id: String,
    pub vpc_external_id: String,
    pub bandwidth_mbps: i64,
}

#[derive(Debug, Clone, Default)]
pub struct VpcCreateOptions {
    pub name: String,
    pub cidr: String,
    pub desc: String,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkCreateOptions {
    pub name: String,
    pub cidr: String,
    pub ip_start: String,
    pub ip_end: String,
    pub default_gateway: String,
    pub vlan_id: i64,
    pub desc: String,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityGroupCreateInput {
    pub name: String,
    pub desc: String,
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityGroupFilterOptions {
    pub name: String,
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityGroupReference {
    pub id: String,
    pub name: String,
}
