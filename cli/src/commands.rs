use crate::argparse::{Cli, Commands};
use crate::output::Listing;
use anyhow::{bail, Context, Result};
use ocm_common::cloudprovider::{CloudRegion, CloudResource, CloudStorage};
use std::collections::HashSet;
use std::sync::Arc;
use winstack::{Region, WinStackClient, WinStackConfig};

pub async fn connect(cli: &Cli) -> Result<Arc<WinStackClient>> {
    let conn = &cli.connection;
    if conn.endpoint.is_empty() {
        bail!("missing --endpoint (or WINSTACK_ENDPOINT)");
    }
    if conn.user.is_empty() || conn.password.is_empty() {
        bail!("missing --user/--password (or WINSTACK_USER/WINSTACK_PASSWORD)");
    }
    tracing::debug!(endpoint = %conn.endpoint, user = %conn.user, "connecting");
    let config = WinStackConfig::new(&conn.endpoint, &conn.user, &conn.password)
        .debug(cli.debug)
        .accept_invalid_certs(cli.insecure);
    WinStackClient::new(config)
        .await
        .with_context(|| format!("Failed to connect to {}", conn.endpoint))
}

fn yes_no(value: bool) -> String {
    let s = if value { "yes" } else { "no" };
    s.to_string()
}

pub async fn handle_command(
    client: &Arc<WinStackClient>,
    region_id: Option<&str>,
    command: &Commands,
) -> Result<Listing> {
    let region = || client.get_region(region_id.unwrap_or_default());
    match command {
        Commands::RegionList => {
            let mut out = Listing::new(&["id", "name", "global_id"]);
            for region in client.regions() {
                out.push(vec![region.id(), region.name(), region.global_id()]);
            }
            Ok(out)
        }
        Commands::ZoneList => zone_list(&region()?).await,
        Commands::HostList => host_list(&region()?).await,
        Commands::VmList { host } => vm_list(&region()?, host.as_deref()).await,
        Commands::VmStart { id } => {
            region()?.start_instance(id).await?;
            Ok(action_done(id, "start"))
        }
        Commands::VmStop { id } => {
            region()?.stop_instance(id).await?;
            Ok(action_done(id, "stop"))
        }
        Commands::StorageList => storage_list(&region()?).await,
        Commands::DiskList => disk_list(&region()?).await,
        Commands::ImageList => image_list(&region()?).await,
        Commands::VpcList => vpc_list(&region()?).await,
        Commands::NetworkList { vpc } => network_list(&region()?, vpc).await,
        Commands::EipList => eip_list(&region()?).await,
        Commands::SecgroupList => secgroup_list(&region()?).await,
        Commands::TaskShow { id } => task_show(&region()?, id).await,
    }
}

fn action_done(id: &str, action: &str) -> Listing {
    let mut out = Listing::new(&["id", "action", "result"]);
    out.push(vec![id.to_string(), action.to_string(), "accepted".to_string()]);
    out
}

async fn zone_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status"]);
    for zone in region.list_zones().await? {
        out.push(vec![zone.id(), zone.name(), zone.status()]);
    }
    Ok(out)
}

async fn host_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status", "ip", "cpus", "mem_mb", "maintenance"]);
    for host in region.list_hosts().await? {
        out.push(vec![
            host.id(),
            host.name(),
            host.host_status(),
            host.access_ip(),
            host.cpu_count().to_string(),
            host.mem_size_mb().to_string(),
            yes_no(host.is_maintenance()),
        ]);
    }
    Ok(out)
}

async fn vm_list(region: &Region, host_id: Option<&str>) -> Result<Listing> {
    let hosts = match host_id {
        Some(id) => vec![region.get_host(id).await?],
        None => region.list_hosts().await?,
    };
    let mut out = Listing::new(&["id", "name", "status", "host", "vcpus", "mem_mb", "os"]);
    for host in hosts {
        for vm in host.list_vms().await.with_context(|| format!("host {}", host.id()))? {
            out.push(vec![
                vm.id(),
                vm.name(),
                vm.status(),
                host.name(),
                vm.vcpu_count().to_string(),
                vm.vmem_size_mb().to_string(),
                vm.os_type().to_string(),
            ]);
        }
    }
    Ok(out)
}

/// Storage pools are visible from every cluster; each is listed once.
async fn unique_storages(region: &Region) -> Result<Vec<Box<dyn CloudStorage>>> {
    let mut seen = HashSet::new();
    let mut storages = Vec::new();
    for zone in region.list_zones().await? {
        for storage in zone.list_storages().await? {
            if seen.insert(storage.global_id()) {
                storages.push(storage);
            }
        }
    }
    Ok(storages)
}

async fn storage_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status", "type", "capacity_mb", "used_mb"]);
    for storage in unique_storages(region).await? {
        out.push(vec![
            storage.id(),
            storage.name(),
            storage.status(),
            storage.storage_type(),
            storage.capacity_mb().to_string(),
            storage.capacity_used_mb().to_string(),
        ]);
    }
    Ok(out)
}

async fn disk_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status", "storage", "size_mb", "type"]);
    for storage in unique_storages(region).await? {
        for disk in storage.list_disks().await? {
            out.push(vec![
                disk.id(),
                disk.name(),
                disk.status(),
                disk.storage_id(),
                disk.disk_size_mb().to_string(),
                disk.disk_type(),
            ]);
        }
    }
    Ok(out)
}

async fn image_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status", "os_version", "min_disk_gb", "storage"]);
    for image in region.image_records().await? {
        out.push(vec![
            image.id.clone(),
            image.name.clone(),
            image.status().to_string(),
            image.os_version.clone(),
            image.min_os_disk_size_gb().to_string(),
            image.storage_id.clone(),
        ]);
    }
    Ok(out)
}

async fn vpc_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "status", "cidr", "default"]);
    for vpc in region.list_vpcs().await? {
        out.push(vec![
            vpc.global_id(),
            vpc.name(),
            vpc.status(),
            vpc.cidr_block(),
            yes_no(vpc.is_default()),
        ]);
    }
    Ok(out)
}

async fn network_list(region: &Region, vpc_id: &str) -> Result<Listing> {
    let vpc = region.get_vpc(vpc_id).await.context("GetVpc")?;
    let mut out = Listing::new(&["id", "name", "status", "ip_start", "ip_end", "mask", "gateway", "wire"]);
    for wire in vpc.list_wires().await? {
        for network in wire.list_networks().await? {
            out.push(vec![
                network.id(),
                network.name(),
                network.status(),
                network.ip_start(),
                network.ip_end(),
                network.ip_mask().to_string(),
                network.gateway(),
                network.wire_id(),
            ]);
        }
    }
    Ok(out)
}

async fn eip_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "ip", "status", "bound_to", "bound_id"]);
    for eip in region.list_eips().await? {
        out.push(vec![
            eip.id(),
            eip.ip_addr(),
            eip.status(),
            eip.association_type(),
            eip.association_external_id(),
        ]);
    }
    Ok(out)
}

async fn secgroup_list(region: &Region) -> Result<Listing> {
    let mut out = Listing::new(&["id", "name", "vpc", "rules", "description"]);
    for group in region.security_group_records("", "").await? {
        out.push(vec![
            group.id,
            group.name,
            group.project_id,
            group.security_group_rules.len().to_string(),
            group.description,
        ]);
    }
    Ok(out)
}

async fn task_show(region: &Region, id: &str) -> Result<Listing> {
    let task = region.get_task(id).await?;
    let mut out = Listing::new(&["id", "name", "status", "step", "target", "finished"]);
    out.push(vec![
        task.id.clone(),
        task.name.clone(),
        task.status.to_string(),
        format!("{}/{} {}", task.step_index, task.step_count, task.step_desc)
            .trim_end()
            .to_string(),
        task.target_name.clone(),
        yes_no(task.is_finished()),
    ]);
    Ok(out)
}
