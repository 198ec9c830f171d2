//! Status and type identifiers shared between the adapters and the compute models.

pub const CLOUD_ENV_PRIVATE_CLOUD: &str = "private_cloud";
pub const CLOUD_PROVIDER_HEALTH_NORMAL: &str = "normal";

pub const CLOUD_REGION_STATUS_INSERVICE: &str = "inservice";
pub const ZONE_ENABLE: &str = "enable";

pub const HOST_STATUS_RUNNING: &str = "running";
pub const HOST_ONLINE: &str = "online";
pub const HOST_OFFLINE: &str = "offline";

pub const VM_RUNNING: &str = "running";
pub const VM_READY: &str = "ready";
pub const VM_STARTING: &str = "starting";
pub const VM_UNKNOWN: &str = "unknown";
pub const VM_DEFAULT_LINUX_LOGIN_USER: &str = "root";
pub const VM_DEFAULT_WINDOWS_LOGIN_USER: &str = "Administrator";

pub const DISK_READY: &str = "ready";
pub const DISK_UNKNOWN: &str = "unknown";
pub const DISK_TYPE_SYS: &str = "sys";
pub const DISK_TYPE_SSD: &str = "ssd";

pub const STORAGE_ONLINE: &str = "online";
pub const STORAGE_OFFLINE: &str = "offline";
pub const STORAGE_LOCAL_SSD: &str = "local_ssd";

pub const CACHED_IMAGE_STATUS_ACTIVE: &str = "active";
pub const STORAGECACHE_STATUS_AVAILABLE: &str = "available";

pub const EIP_STATUS_READY: &str = "ready";
pub const EIP_MODE_STANDALONE_EIP: &str = "elastic_ip";
pub const EIP_ASSOCIATE_TYPE_SERVER: &str = "server";
pub const EIP_ASSOCIATE_TYPE_ROUTE_TABLE: &str = "route_table";
pub const EIP_CHARGE_TYPE_BY_TRAFFIC: &str = "traffic";

pub const SECGROUP_STATUS_READY: &str = "ready";
pub const NORMAL_VPC_ID: &str = "normal";

pub const VPC_STATUS_AVAILABLE: &str = "available";
pub const VPC_EXTERNAL_ACCESS_MODE_EIP: &str = "eip";
pub const VPC_EXTERNAL_ACCESS_MODE_DISTGW: &str = "distgw";

pub const WIRE_STATUS_AVAILABLE: &str = "available";
pub const NETWORK_STATUS_AVAILABLE: &str = "available";
pub const NETWORK_TYPE_GUEST: &str = "guest";
pub const NETWORK_TYPE_EIP: &str = "eip";

pub const ROUTE_TABLE_AVAILABLE: &str = "available";
pub const ROUTE_TABLE_PENDING: &str = "pending";
pub const ROUTE_TABLE_CREATE_FAILED: &str = "create_failed";
pub const ROUTE_TABLE_DELETING: &str = "deleting";
pub const ROUTE_TABLE_DELETE_FAILED: &str = "delete_failed";
pub const ROUTE_TABLE_ASSOCIATION_PENDING: &str = "pending";
pub const ROUTE_TABLE_ASSOCIATION_AVAILABLE: &str = "available";
pub const ROUTE_TABLE_ASSOCIATION_CREATE_FAILED: &str = "create_failed";
pub const ROUTE_ENTRY_TYPE_CUSTOM: &str = "custom";

pub const OS_ARCH_X86: &str = "x86";
pub const OS_ARCH_X86_64: &str = "x86_64";
pub const OS_ARCH_AARCH64: &str = "aarch64";
pub const OS_ARCH_MIPS64EL: &str = "mips64el";

pub const CLOUD_SHELL: &str = "cloud-shell";

pub const CLOUD_CAPABILITY_PROJECT: &str = "project";
pub const CLOUD_CAPABILITY_COMPUTE: &str = "compute";
pub const CLOUD_CAPABILITY_NETWORK: &str = "network";
pub const CLOUD_CAPABILITY_EIP: &str = "eip";
pub const CLOUD_CAPABILITY_LOADBALANCER: &str = "loadbalancer";
pub const CLOUD_CAPABILITY_OBJECTSTORE: &str = "objectstore";
pub const CLOUD_CAPABILITY_RDS: &str = "rds";
pub const CLOUD_CAPABILITY_CACHE: &str = "cache";
pub const CLOUD_CAPABILITY_EVENT: &str = "event";
pub const CLOUD_CAPABILITY_CLOUDID: &str = "cloudid";
pub const CLOUD_CAPABILITY_DNSZONE: &str = "dnszone";
pub const CLOUD_CAPABILITY_INTERVPCNETWORK: &str = "intervpcnetwork";
pub const CLOUD_CAPABILITY_SAML_AUTH: &str = "saml_auth";
pub const CLOUD_CAPABILITY_NAT: &str = "nat";
pub const CLOUD_CAPABILITY_NAS: &str = "nas";
pub const CLOUD_CAPABILITY_WAF: &str = "waf";
