//! Per-hypervisor behaviour the scheduler and the server manager consult.

use crate::options::ComputeOptions;
use ocm_common::consts::{
    CLOUD_ENV_PRIVATE_CLOUD, CLOUD_SHELL, VM_DEFAULT_LINUX_LOGIN_USER,
    VM_DEFAULT_WINDOWS_LOGIN_USER, VM_READY, VM_RUNNING,
};
use serde::Serialize;
use winstack::storage::StorageKind;
use winstack::{CLOUD_PROVIDER_WINSTACK, HYPERVISOR_WINSTACK};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsDefaultAccount {
    pub default_account: String,
    pub changeable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceCapability {
    pub hypervisor: String,
    pub provider: String,
    pub linux: OsDefaultAccount,
    pub windows: OsDefaultAccount,
}

/// Keys the quota subsystem charges a guest against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComputeQuotaKeys {
    pub project_id: String,
    pub cloud_env: String,
    pub provider: String,
    pub brand: String,
    pub hypervisor: String,
}

pub trait GuestDriver: Send + Sync {
    fn hypervisor(&self) -> &'static str;
    fn provider(&self) -> &'static str;
    fn minimal_sys_disk_size_gb(&self) -> u64;
    fn instance_capability(&self) -> InstanceCapability;
    fn compute_quota_keys(&self, project_id: &str, brand: &str) -> ComputeQuotaKeys;

    fn default_sys_disk_backend(&self) -> String {
        String::new()
    }

    fn storage_types(&self) -> Vec<String>;

    fn need_inject_password_by_cloud_init(&self) -> bool {
        false
    }

    fn windows_user_data_need_encode(&self) -> bool {
        false
    }

    fn initial_state_after_create(&self) -> &'static str;
    fn initial_state_after_rebuild(&self) -> &'static str;

    fn user_data_type(&self) -> &'static str {
        ""
    }

    fn allow_reconfig(&self) -> bool {
        false
    }

    /// `cycle` is a billing period such as `1M` or `1Y`.
    fn supports_billing_cycle(&self, _cycle: &str) -> bool {
        false
    }

    fn schedule_cpu_filter(&self) -> bool {
        true
    }

    fn schedule_memory_filter(&self) -> bool {
        true
    }

    fn schedule_sku_filter(&self) -> bool {
        true
    }

    fn schedule_storage_filter(&self) -> bool {
        true
    }
}

pub struct WinStackGuestDriver {
    options: ComputeOptions,
}

impl WinStackGuestDriver {
    pub fn new(options: ComputeOptions) -> Self {
        Self { options }
    }
}

impl GuestDriver for WinStackGuestDriver {
    fn hypervisor(&self) -> &'static str {
        HYPERVISOR_WINSTACK
    }

    fn provider(&self) -> &'static str {
        CLOUD_PROVIDER_WINSTACK
    }

    fn minimal_sys_disk_size_gb(&self) -> u64 {
        self.options.default_disk_size_mb / 1024
    }

    fn instance_capability(&self) -> InstanceCapability {
        InstanceCapability {
            hypervisor: self.hypervisor().to_string(),
            provider: self.provider().to_string(),
            linux: OsDefaultAccount {
                default_account: VM_DEFAULT_LINUX_LOGIN_USER.to_string(),
                changeable: true,
            },
            windows: OsDefaultAccount {
                default_account: VM_DEFAULT_WINDOWS_LOGIN_USER.to_string(),
                changeable: false,
            },
        }
    }

    fn compute_quota_keys(&self, project_id: &str, _brand: &str) -> ComputeQuotaKeys {
        ComputeQuotaKeys {
            project_id: project_id.to_string(),
            cloud_env: CLOUD_ENV_PRIVATE_CLOUD.to_string(),
            provider: CLOUD_PROVIDER_WINSTACK.to_string(),
            brand: CLOUD_PROVIDER_WINSTACK.to_string(),
            hypervisor: HYPERVISOR_WINSTACK.to_string(),
        }
    }

    fn storage_types(&self) -> Vec<String> {
        [
            StorageKind::Local,
            StorageKind::IpSan,
            StorageKind::FcSan,
            StorageKind::Ceph,
            StorageKind::Nas,
            StorageKind::Nvme,
        ]
        .iter()
        .map(|kind| kind.to_string())
        .collect()
    }

    fn need_inject_password_by_cloud_init(&self) -> bool {
        true
    }

    fn windows_user_data_need_encode(&self) -> bool {
        true
    }

    fn initial_state_after_create(&self) -> &'static str {
        VM_RUNNING
    }

    fn initial_state_after_rebuild(&self) -> &'static str {
        VM_READY
    }

    fn user_data_type(&self) -> &'static str {
        CLOUD_SHELL
    }

    fn allow_reconfig(&self) -> bool {
        true
    }

    fn schedule_cpu_filter(&self) -> bool {
        false
    }

    fn schedule_sku_filter(&self) -> bool {
        false
    }
}
