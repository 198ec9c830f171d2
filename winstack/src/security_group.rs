use crate::client::{decode, decode_list};
use crate::region::Region;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::{NORMAL_VPC_ID, SECGROUP_STATUS_READY};
use ocm_common::secrules::{Direction, SecurityRule, PROTO_ANY, PROTO_TCP, PROTO_UDP};
use ocm_common::CloudError;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

const SECURITY_GROUP_LIST_URL: &str = "/api/sdn/v2.0/security-groups";
const SECURITY_GROUP_RULE_URL: &str = "/api/sdn/v2.0/security-group-rules";

static PORT_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityGroupRuleInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub direction: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ethertype: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub remote_group_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub security_group_id: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub priority: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub protocol: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub port_range_max: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub port_range_min: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub remote_ip_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityGroupInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub description: String,
    /// Owning VPC.
    #[serde(
        alias = "projectId",
        alias = "project_Id",
        deserialize_with = "crate::de::string"
    )]
    pub project_id: String,
    #[serde(alias = "securityGroupRules")]
    pub security_group_rules: Vec<SecurityGroupRuleInfo>,
}

/// A port currently bound to a security group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityGroupPort {
    #[serde(deserialize_with = "crate::de::string")]
    pub mac_address: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
}

/// First run of digits in `s`, or 0.
fn first_port(s: &str) -> i32 {
    let re = PORT_RE.get_or_init(|| Regex::new(r"[0-9]+").unwrap());
    re.find(s)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

impl SecurityGroupInfo {
    /// Rules without a remote prefix are not reported.
    pub fn rules(&self) -> Result<Vec<SecurityRule>> {
        let mut rules = Vec::new();
        for raw in &self.security_group_rules {
            if raw.remote_ip_prefix.is_empty() {
                continue;
            }
            let mut rule = SecurityRule {
                description: self.description.clone(),
                external_id: raw.id.clone(),
                ..Default::default()
            };
            if raw.direction == "egress" {
                rule.direction = Direction::Out;
            }
            if !raw.protocol.is_empty() {
                rule.protocol = raw.protocol.clone();
            }
            if rule.protocol == PROTO_TCP || rule.protocol == PROTO_UDP {
                rule.port_start = first_port(&raw.port_range_min);
                rule.port_end = first_port(&raw.port_range_max);
            }
            let prefix = if raw.remote_ip_prefix == "::/0" {
                "0.0.0.0/0"
            } else {
                raw.remote_ip_prefix.as_str()
            };
            rule.parse_cidr(prefix)?;
            rule.validate()?;
            rules.push(rule);
        }
        Ok(rules)
    }
}

impl Region {
    pub async fn security_group_records(&self, id: &str, name: &str) -> Result<Vec<SecurityGroupInfo>> {
        let mut query = Vec::new();
        if !id.is_empty() {
            query.push(("id", id.to_string()));
        }
        if !name.is_empty() {
            query.push(("name", name.to_string()));
        }
        let resp = self.client().get(SECURITY_GROUP_LIST_URL, &query).await?;
        decode_list(resp, "security_groups")
    }

    pub async fn security_group_record(&self, id: &str) -> Result<SecurityGroupInfo> {
        self.security_group_records(id, "")
            .await?
            .into_iter()
            .find(|g| g.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub(crate) async fn security_group_by_global_id(&self, id: &str) -> Result<SecurityGroup> {
        self.security_group_records("", "")
            .await?
            .into_iter()
            .find(|g| g.id == id)
            .map(|info| SecurityGroup::new(self.clone(), info))
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub(crate) async fn security_group_by_name(&self, name: &str) -> Result<SecurityGroup> {
        self.security_group_records("", name)
            .await?
            .into_iter()
            .find(|g| g.name == name)
            .map(|info| SecurityGroup::new(self.clone(), info))
            .ok_or_else(|| CloudError::not_found(name).into())
    }

    pub async fn security_groups_by_vm(&self, instance_id: &str) -> Result<Vec<SecurityGroupInfo>> {
        let url = format!("/api/network/vpc/vms/{}/security-groups", instance_id);
        let resp = self.client().get(&url, &[]).await?;
        decode_list(resp, "security_groups")
    }

    pub(crate) async fn create_security_group_record(
        &self,
        vpc_id: &str,
        name: &str,
        desc: &str,
    ) -> Result<SecurityGroup> {
        let body = json!({
            "security_group": {
                "name": name,
                "description": desc,
                "project_Id": vpc_id,
            }
        });
        let resp = self
            .client()
            .post(SECURITY_GROUP_LIST_URL, &body)
            .await
            .with_context(|| format!("CreateSecurityGroup {}", name))?;
        let info: SecurityGroupInfo = decode(resp, "security_group")?;
        Ok(SecurityGroup::new(self.clone(), info))
    }

    pub async fn security_group_ports(&self, secgroup_id: &str) -> Result<Vec<SecurityGroupPort>> {
        let url = format!("{}/{}/ports", SECURITY_GROUP_LIST_URL, secgroup_id);
        let resp = self.client().get(&url, &[]).await?;
        decode_list(resp, "ports")
    }

    /// Bind the instance's first port in `vpc_id` to the group, keeping the
    /// ports already bound.
    pub async fn assign_security_group(
        &self,
        instance_id: &str,
        vpc_id: &str,
        secgroup_id: &str,
    ) -> Result<()> {
        self.get_instance_by_id(instance_id).await?;
        self.security_group_record(secgroup_id).await?;

        let mut port_ids: Vec<String> = self
            .security_group_ports(secgroup_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        let vpc_instances = self.instances_by_vpc(vpc_id).await?;
        for domain in vpc_instances.vpc_list {
            if domain.domain_id != instance_id {
                continue;
            }
            if let Some(iface) = domain.interface_list.first() {
                port_ids.push(iface.interface_id.clone());
            }
        }

        let url = format!("{}/{}/ports", SECURITY_GROUP_LIST_URL, secgroup_id);
        self.client()
            .post(&url, &json!({ "portIds": port_ids }))
            .await?;
        Ok(())
    }

    pub async fn delete_security_group_rule(&self, rule_id: &str) -> Result<()> {
        let url = format!("{}/{}", SECURITY_GROUP_RULE_URL, rule_id);
        self.client().delete(&url).await?;
        Ok(())
    }

    /// One POST per explicit port, otherwise a single POST with the range.
    pub async fn add_security_group_rule(&self, secgroup_id: &str, rule: &SecurityRule) -> Result<()> {
        let direction = match rule.direction {
            Direction::In => "ingress",
            Direction::Out => "egress",
        };
        let mut info = Map::new();
        info.insert("direction".into(), json!(direction));
        info.insert("security_group_id".into(), json!(secgroup_id));
        info.insert("remote_ip_prefix".into(), json!(rule.ip_net.to_string()));
        info.insert("ethertype".into(), json!("Ipv4"));
        if rule.protocol != PROTO_ANY && !rule.protocol.is_empty() {
            info.insert("protocol".into(), json!(rule.protocol));
        }

        if !rule.ports.is_empty() {
            for port in &rule.ports {
                info.insert("port_range_max".into(), json!(port));
                info.insert("port_range_min".into(), json!(port));
                let body = json!({ "security_group_rule": Value::Object(info.clone()) });
                self.client()
                    .post(SECURITY_GROUP_RULE_URL, &body)
                    .await
                    .context("SecurityGroup create")?;
            }
            return Ok(());
        }
        if rule.port_start > 0 && rule.port_end > 0 {
            info.insert("port_range_min".into(), json!(rule.port_start));
            info.insert("port_range_max".into(), json!(rule.port_end));
        }
        let body = json!({ "security_group_rule": Value::Object(info) });
        self.client().post(SECURITY_GROUP_RULE_URL, &body).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SecurityGroup {
    region: Region,
    info: SecurityGroupInfo,
}

impl SecurityGroup {
    pub(crate) fn new(region: Region, info: SecurityGroupInfo) -> Self {
        Self { region, info }
    }

    pub fn info(&self) -> &SecurityGroupInfo {
        &self.info
    }
}

#[async_trait]
impl CloudResource for SecurityGroup {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        SECGROUP_STATUS_READY.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.info = self.region.security_group_record(&self.info.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudSecurityGroup for SecurityGroup {
    fn description(&self) -> String {
        self.info.description.clone()
    }

    fn rules(&self) -> Result<Vec<SecurityRule>> {
        self.info.rules()
    }

    fn vpc_id(&self) -> String {
        if self.info.project_id.is_empty() {
            NORMAL_VPC_ID.to_string()
        } else {
            self.info.project_id.clone()
        }
    }

    async fn sync_rules(
        &self,
        _common: &[SecurityRule],
        in_adds: &[SecurityRule],
        out_adds: &[SecurityRule],
        in_dels: &[SecurityRule],
        out_dels: &[SecurityRule],
    ) -> Result<()> {
        for rule in in_dels.iter().chain(out_dels) {
            if rule.external_id.is_empty() {
                continue;
            }
            self.region
                .delete_security_group_rule(&rule.external_id)
                .await
                .with_context(|| format!("delSecurityGroupRule({})", rule.external_id))?;
        }
        for rule in in_adds.iter().chain(out_adds) {
            self.region
                .add_security_group_rule(&self.info.id, rule)
                .await
                .with_context(|| format!("addSecgroupRules({})", rule))?;
        }
        Ok(())
    }
}
