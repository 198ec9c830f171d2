use crate::classic_vpc::ClassicVpc;
use crate::client::{decode, decode_list, paginate, PageQuery};
use crate::region::Region;
use crate::route_table::RouteTable;
use crate::security_group::SecurityGroup;
use crate::wire::Wire;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::VPC_STATUS_AVAILABLE;
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::json;

const VPC_LIST_URL: &str = "/api/network/vpcs";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VpcInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
}

impl Region {
    pub async fn get_vpcs(&self, id: &str, start: i64, size: i64) -> Result<Vec<VpcInfo>> {
        let query = PageQuery::new(start, size).id("id", id);
        let resp = self.client().get(VPC_LIST_URL, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn vpc_records(&self) -> Result<Vec<VpcInfo>> {
        paginate(|start, size| self.get_vpcs("", start, size)).await
    }

    pub async fn get_vpc_record(&self, id: &str) -> Result<VpcInfo> {
        self.get_vpcs(id, 0, 0)
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    /// VPCs followed by the external networks posing as VPCs.
    pub(crate) async fn all_vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>> {
        let mut vpcs: Vec<Box<dyn CloudVpc>> = self
            .vpc_records()
            .await
            .context("ListVpcs")?
            .into_iter()
            .map(|info| Box::new(Vpc::new(self.clone(), info)) as Box<dyn CloudVpc>)
            .collect();
        let classic = self
            .classic_vpc_records()
            .await
            .context("ListClassicVpcs")?;
        vpcs.extend(
            classic
                .into_iter()
                .map(|info| Box::new(ClassicVpc::new(self.clone(), info)) as Box<dyn CloudVpc>),
        );
        Ok(vpcs)
    }

    pub async fn create_vpc_record(&self, name: &str, desc: &str) -> Result<Vpc> {
        let body = json!({ "name": name, "remark": desc });
        let resp = self
            .client()
            .post(VPC_LIST_URL, &body)
            .await
            .with_context(|| format!("CreateVpc {}", name))?;
        Ok(Vpc::new(self.clone(), decode(resp, "")?))
    }

    pub async fn delete_vpc(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}/delete", VPC_LIST_URL, id);
        self.client().post(&url, &serde_json::Value::Null).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Vpc {
    region: Region,
    info: VpcInfo,
}

impl Vpc {
    pub(crate) fn new(region: Region, info: VpcInfo) -> Self {
        Self { region, info }
    }

    pub fn info(&self) -> &VpcInfo {
        &self.info
    }

    /// The first router of this VPC carrying routes, if any.
    pub async fn route_tables(&self) -> Result<Vec<RouteTable>> {
        let routers = self.region.routers().await.context("vpc.region.GetRouter")?;
        Ok(routers
            .into_iter()
            .find(|r| !r.routes.is_empty() && r.project_id == self.info.id)
            .map(|r| RouteTable::new(self.region.clone(), &self.info.id, r))
            .into_iter()
            .collect())
    }
}

#[async_trait]
impl CloudResource for Vpc {
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
        VPC_STATUS_AVAILABLE.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.info = self.region.get_vpc_record(&self.info.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudVpc for Vpc {
    fn region_id(&self) -> String {
        self.region.id()
    }

    fn is_default(&self) -> bool {
        true
    }

    fn cidr_block(&self) -> String {
        String::new()
    }

    async fn list_security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>> {
        Ok(self
            .region
            .security_group_records("", "")
            .await?
            .into_iter()
            .filter(|g| g.project_id == self.info.id)
            .map(|info| {
                Box::new(SecurityGroup::new(self.region.clone(), info)) as Box<dyn CloudSecurityGroup>
            })
            .collect())
    }

    async fn list_route_tables(&self) -> Result<Vec<Box<dyn CloudRouteTable>>> {
        Ok(self
            .route_tables()
            .await?
            .into_iter()
            .map(|t| Box::new(t) as Box<dyn CloudRouteTable>)
            .collect())
    }

    async fn create_route_table(
        &self,
        opts: &RouteTableCreateOptions,
    ) -> Result<Box<dyn CloudRouteTable>> {
        let router = self
            .region
            .create_router(&self.info.id, &opts.name, &opts.network_id)
            .await?;
        Ok(Box::new(RouteTable::new(
            self.region.clone(),
            &self.info.id,
            router,
        )))
    }

    async fn delete(&self) -> Result<()> {
        self.region.delete_vpc(&self.info.id).await
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>> {
        Ok(self
            .region
            .get_clusters()
            .await?
            .into_iter()
            .map(|cluster| {
                Box::new(Wire::new(self.region.clone(), self.info.clone(), cluster))
                    as Box<dyn CloudWire>
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, path, test_region};
    use mockito::{Matcher, Server};

    const ROUTERS: &str = r#"{"routers":[
        {"id":"r-0","name":"other","status":"ACTIVE","project_Id":"vpc-2","routes":[{"destination":"0.0.0.0/0","nexthop":"10.0.0.1"}]},
        {"id":"r-1","name":"empty","status":"ACTIVE","project_Id":"vpc-1","routes":[]},
        {"id":"r-2","name":"main","status":"ACTIVE","project_Id":"vpc-1","routes":[{"destination":"0.0.0.0/0","nexthop":"192.168.1.1"}]},
        {"id":"r-3","name":"second","status":"ACTIVE","project_Id":"vpc-1","routes":[{"destination":"10.0.0.0/8","nexthop":"192.168.1.2"}]}
    ]}"#;

    #[tokio::test]
    async fn test_region_vpcs_include_classic_vpcs() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/network/vpcs",
            r#"{"data":[{"id":"vpc-1","name":"prod"}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/network/networks/external_nets",
            r#"[{"id":"ext-1","name":"public"}]"#,
        )
        .await;

        let vpcs = region.list_vpcs().await.unwrap();
        assert_eq!(vpcs.len(), 2);
        assert!(vpcs[0].is_default());
        assert!(!vpcs[0].is_external_net());
        assert!(vpcs[1].is_external_net());

        let vpc = region.get_vpc("vpc-1").await.unwrap();
        assert_eq!(vpc.name(), "prod");
        assert_eq!(vpc.status(), "available");
        assert_eq!(vpc.external_access_mode(), "eip");
    }

    #[tokio::test]
    async fn test_route_table_is_first_router_with_routes() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(&mut server, "GET", "/api/sdn/v2.0/routers", ROUTERS).await;

        let vpc = Vpc::new(
            region,
            VpcInfo {
                id: "vpc-1".to_string(),
                name: "prod".to_string(),
            },
        );
        let tables = vpc.list_route_tables().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].global_id(), "r-2");
        assert_eq!(vpc.get_route_table("r-2").await.unwrap().name(), "main");
        assert!(ocm_common::is_not_found(
            &vpc.get_route_table("r-3").await.err().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_vpc_security_groups_filter_by_project() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/sdn/v2.0/security-groups",
            r#"{"security_groups":[{"id":"sg-1","name":"web","project_id":"vpc-1"},{"id":"sg-2","name":"db","project_id":"vpc-2"}]}"#,
        )
        .await;

        let vpc = Vpc::new(
            region,
            VpcInfo {
                id: "vpc-1".to_string(),
                name: "prod".to_string(),
            },
        );
        let groups = vpc.list_security_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].global_id(), "sg-1");
    }

    #[tokio::test]
    async fn test_vpc_lifecycle() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let create = server
            .mock("POST", path("/api/network/vpcs"))
            .match_body(Matcher::Json(json!({"name": "stage", "remark": "staging"})))
            .with_status(200)
            .with_body(r#"{"id":"vpc-5","name":"stage"}"#)
            .expect(2)
            .create_async()
            .await;
        let router = server
            .mock("POST", "/api/network/vpcs/vpc-5/routers")
            .match_body(Matcher::Json(json!({"name": "rt-stage", "network_id": "net-5"})))
            .with_status(200)
            .with_body(r#"{"id":"r-5","name":"rt-stage","status":"ACTIVE","project_Id":"vpc-5"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/api/network/vpcs/vpc-5/delete")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        mock_json(&mut server, "GET", "/api/network/vpcs", r#"{"data":[{"id":"vpc-5","name":"stage-renamed"}]}"#).await;

        let created = region
            .create_vpc(&VpcCreateOptions {
                name: "stage".to_string(),
                desc: "staging".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.global_id(), "vpc-5");

        let table = created
            .create_route_table(&RouteTableCreateOptions {
                name: "rt-stage".to_string(),
                vpc_id: "vpc-5".to_string(),
                network_id: "net-5".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(table.global_id(), "r-5");
        assert_eq!(table.status(), "available");

        let mut vpc = region.create_vpc_record("stage", "staging").await.unwrap();
        vpc.refresh().await.unwrap();
        assert_eq!(vpc.name(), "stage-renamed");
        vpc.delete().await.unwrap();

        create.assert_async().await;
        router.assert_async().await;
        delete.assert_async().await;
    }
}
