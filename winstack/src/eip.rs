use crate::client::{decode, decode_list, paginate, PageQuery};
use crate::region::Region;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::*;
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::json;

const FLOAT_IP_LIST_URL: &str = "/api/network/floatIps";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EipInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub mapping_ip: String,
    /// `VM` or `ROUTER` when bound.
    #[serde(deserialize_with = "crate::de::string")]
    pub bind_dev_type: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub bind_dev_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub bind_dev_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ext_network_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ext_network_name: String,
}

impl Region {
    pub async fn get_eips(&self, ip: &str, start: i64, size: i64) -> Result<Vec<EipInfo>> {
        let query = PageQuery::new(start, size).id("ip", ip);
        let resp = self.client().get(FLOAT_IP_LIST_URL, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn eips(&self) -> Result<Vec<Eip>> {
        let infos = paginate(|start, size| self.get_eips("", start, size)).await?;
        Ok(infos
            .into_iter()
            .map(|info| Eip::new(self.clone(), info))
            .collect())
    }

    pub async fn eip_by_ip(&self, ip: &str) -> Result<EipInfo> {
        self.get_eips(ip, 0, 1)
            .await?
            .into_iter()
            .find(|e| e.ip == ip)
            .ok_or_else(|| CloudError::not_found(ip).into())
    }

    pub async fn eip_by_bind_id(&self, bind_id: &str) -> Result<Eip> {
        self.eips()
            .await?
            .into_iter()
            .find(|e| e.info.bind_dev_id == bind_id)
            .ok_or_else(|| CloudError::not_found(bind_id).into())
    }

    pub(crate) async fn create_eip_record(&self, opts: &EipCreateOptions) -> Result<Eip> {
        let network = self
            .classic_network_by_id(&opts.network_external_id)
            .await
            .with_context(|| format!("GetClassicNetworkById {}", opts.network_external_id))?;
        let body = json!({
            "extNetId": network.id,
            "ip": opts.ip,
            "vpcId": opts.vpc_external_id,
        });
        let resp = self
            .client()
            .post(&format!("{}/assgin", FLOAT_IP_LIST_URL), &body)
            .await?;
        Ok(Eip::new(self.clone(), decode(resp, "")?))
    }
}

#[derive(Clone)]
pub struct Eip {
    region: Region,
    info: EipInfo,
}

impl Eip {
    pub(crate) fn new(region: Region, info: EipInfo) -> Self {
        Self { region, info }
    }

    pub fn info(&self) -> &EipInfo {
        &self.info
    }

    fn url(&self, action: &str) -> String {
        format!("{}/{}/{}", FLOAT_IP_LIST_URL, self.info.id, action)
    }
}

#[async_trait]
impl CloudResource for Eip {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.ip.clone()
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        EIP_STATUS_READY.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.info = self.region.eip_by_ip(&self.info.ip).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudEip for Eip {
    fn ip_addr(&self) -> String {
        self.info.ip.clone()
    }

    fn mode(&self) -> String {
        EIP_MODE_STANDALONE_EIP.to_string()
    }

    async fn network_id(&self) -> String {
        let network = match self.region.classic_network_by_id(&self.info.ext_network_id).await {
            Ok(network) => network,
            Err(e) => {
                tracing::error!(
                    "Failed to find extNetwork {} for eip ({}): {:#}",
                    self.info.ext_network_id,
                    self.info.ip,
                    e
                );
                return String::new();
            }
        };
        if network.contains(&self.info.ip) {
            return network.id;
        }
        tracing::error!(
            "Eip {} is outside its extNetwork {}",
            self.info.ip,
            self.info.ext_network_id
        );
        String::new()
    }

    async fn vpc_id(&self) -> String {
        self.region
            .get_vpc(&self.info.vpc_id)
            .await
            .map(|vpc| vpc.global_id())
            .unwrap_or_default()
    }

    fn association_type(&self) -> String {
        match self.info.bind_dev_type.as_str() {
            "VM" => EIP_ASSOCIATE_TYPE_SERVER,
            "ROUTER" => EIP_ASSOCIATE_TYPE_ROUTE_TABLE,
            _ => "",
        }
        .to_string()
    }

    fn association_external_id(&self) -> String {
        match self.info.bind_dev_type.as_str() {
            "VM" | "ROUTER" => self.info.bind_dev_id.clone(),
            _ => String::new(),
        }
    }

    fn bandwidth(&self) -> i64 {
        0
    }

    fn internet_charge_type(&self) -> String {
        EIP_CHARGE_TYPE_BY_TRAFFIC.to_string()
    }

    async fn delete(&self) -> Result<()> {
        self.region
            .client()
            .post(&self.url("release"), &serde_json::Value::Null)
            .await?;
        Ok(())
    }

    /// Bind to the port of the instance's last NIC.
    async fn associate(&self, conf: &AssociateConfig) -> Result<()> {
        if conf.associate_type != EIP_ASSOCIATE_TYPE_SERVER {
            return Err(CloudError::not_implemented(format!(
                "associate eip with {}",
                conf.associate_type
            ))
            .into());
        }
        let nics = self.region.instance_nics(&conf.instance_id).await?;
        let nic = nics
            .last()
            .ok_or_else(|| anyhow!("GetInstanceNics is empty"))?;
        let instance = self.region.get_instance_by_id(&conf.instance_id).await?;
        let body = json!({
            "deviceType": "VM",
            "vpcId": nic.vpc.vpc_id,
            "portName": nic.interface_id,
            "deviceId": conf.instance_id,
            "deviceName": instance.name,
        });
        self.region.client().post(&self.url("bind"), &body).await?;
        Ok(())
    }

    async fn dissociate(&self) -> Result<()> {
        self.region
            .client()
            .post(&self.url("unbind"), &serde_json::Value::Null)
            .await?;
        Ok(())
    }
}
