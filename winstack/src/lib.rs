//! WinStack adapter: a REST client for the WinStack management API and the
//! resource handles that expose it through `ocm_common::cloudprovider`.

pub mod classic_network;
pub mod classic_vpc;
pub mod classic_wire;
pub mod client;
pub mod cluster;
mod de;
pub mod disk;
pub mod eip;
pub mod host;
pub mod image;
pub mod instance;
pub mod instance_nic;
pub mod network;
pub mod provider;
pub mod region;
pub mod route_table;
pub mod router;
pub mod security_group;
pub mod storage;
pub mod storage_cache;
pub mod task;
pub mod vpc;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use client::{WinStackClient, WinStackConfig, WinStackError, CLOUD_PROVIDER_WINSTACK, HYPERVISOR_WINSTACK};
pub use provider::{WinStackProvider, WinStackProviderFactory};
pub use region::Region;
