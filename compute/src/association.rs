//! Lifecycle of route-table associations on the platform side.

use crate::models::{
    parse_association_type, RouteTable, RouteTableAssociation, RouteTableAssociationCreateInput,
};
use crate::store::{ComputeStore, EventSink, ACT_CREATE, ACT_SYNC_UPDATE};
use crate::tasks::ROUTE_TABLE_ASSOCIATION_CREATE_TASK;
use crate::taskman::TaskEngine;
use anyhow::{Context, Result};
use ocm_common::cloudprovider::{self as cloud, RouteTableAssociationType};
use ocm_common::consts::ROUTE_TABLE_ASSOCIATION_CREATE_FAILED;
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct BatchCreateRequest {
    route_table_id: String,
    association: Vec<RouteTableAssociationCreateInput>,
}

fn input_error(msg: String) -> anyhow::Error {
    CloudError::InputParameter(msg).into()
}

pub struct RouteTableAssociationManager {
    store: Arc<dyn ComputeStore>,
    engine: Arc<dyn TaskEngine>,
    events: Arc<dyn EventSink>,
}

impl RouteTableAssociationManager {
    pub fn new(
        store: Arc<dyn ComputeStore>,
        engine: Arc<dyn TaskEngine>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            engine,
            events,
        }
    }

    /// Reject unknown types and duplicates; subnet associations get the
    /// network's external id filled in.
    pub async fn validate_create_data(
        &self,
        mut input: RouteTableAssociationCreateInput,
    ) -> Result<RouteTableAssociationCreateInput> {
        let kind = parse_association_type(&input.association_type)?;
        let existing = self
            .store
            .count_associations(
                &input.route_table_id,
                &input.associated_resource_id,
                &input.association_type,
            )
            .await?;
        if existing > 0 {
            return Err(input_error(format!(
                "associated_resource_id[{}] already exist",
                input.associated_resource_id
            )));
        }
        if kind == RouteTableAssociationType::Subnet {
            let network = self
                .store
                .fetch_network(&input.associated_resource_id)
                .await
                .map_err(|_| {
                    input_error(format!(
                        "invalid associated_resource_id {}",
                        input.associated_resource_id
                    ))
                })?;
            input.ext_associated_resource_id = network.external_id;
        }
        Ok(input)
    }

    /// Start the create task for a freshly stored association.
    pub async fn post_create(&self, assoc: &RouteTableAssociation, user: &str) {
        if let Err(e) = self
            .engine
            .new_task(ROUTE_TABLE_ASSOCIATION_CREATE_TASK, &assoc.id, user, Value::Null)
            .await
        {
            let reason = format!("NewTask: {:#}", e);
            tracing::warn!("Failed to start association task for {}: {}", assoc.id, reason);
            if let Err(e) = self
                .store
                .set_association_status(&assoc.id, ROUTE_TABLE_ASSOCIATION_CREATE_FAILED, &reason)
                .await
            {
                tracing::error!("Failed to mark association {} failed: {:#}", assoc.id, e);
            }
        }
    }

    /// `{"route_table_id": .., "association": [{association_type, associated_resource_id}, ..]}`
    pub async fn perform_batch_create(
        &self,
        user: &str,
        data: &Value,
    ) -> Result<Vec<RouteTableAssociation>> {
        let request: BatchCreateRequest = serde_json::from_value(data.clone())
            .map_err(|e| input_error(format!("invalid batch request: {}", e)))?;
        let mut created = Vec::with_capacity(request.association.len());
        for mut input in request.association {
            input.route_table_id = request.route_table_id.clone();
            let input = self.validate_create_data(input).await?;
            let assoc = self
                .store
                .insert_association(RouteTableAssociation {
                    route_table_id: input.route_table_id,
                    association_type: input.association_type,
                    associated_resource_id: input.associated_resource_id,
                    ext_associated_resource_id: input.ext_associated_resource_id,
                    ..Default::default()
                })
                .await?;
            self.engine
                .new_task(ROUTE_TABLE_ASSOCIATION_CREATE_TASK, &assoc.id, user, Value::Null)
                .await
                .context(ROUTE_TABLE_ASSOCIATION_CREATE_TASK)?;
            created.push(assoc);
        }
        Ok(created)
    }

    /// Platform id of the subnet behind a cloud association, when known.
    async fn local_resource_id(
        &self,
        table: &RouteTable,
        cloud_assoc: &cloud::RouteTableAssociation,
    ) -> String {
        if cloud_assoc.association_type != RouteTableAssociationType::Subnet {
            return String::new();
        }
        self.store
            .network_by_ext_id(&table.vpc_id, &cloud_assoc.associated_resource_id)
            .await
            .map(|n| n.id)
            .unwrap_or_default()
    }

    pub async fn sync_with_cloud_association(
        &self,
        assoc: &RouteTableAssociation,
        cloud_assoc: &cloud::RouteTableAssociation,
        user: &str,
    ) -> Result<()> {
        let table = self
            .store
            .fetch_route_table(&assoc.route_table_id)
            .await
            .context("GetRouteTable")?;
        let updated = RouteTableAssociation {
            association_type: cloud_assoc.association_type.to_string(),
            ext_associated_resource_id: cloud_assoc.associated_resource_id.clone(),
            associated_resource_id: self.local_resource_id(&table, cloud_assoc).await,
            ..assoc.clone()
        };
        self.store.update_association(&updated).await?;
        let diff = format!(
            "associated_resource_id: {} -> {}",
            assoc.associated_resource_id, updated.associated_resource_id
        );
        self.events
            .ops_log(&updated.object_ref(), ACT_SYNC_UPDATE, &diff, user);
        Ok(())
    }

    pub async fn new_association_from_cloud(
        &self,
        table: &RouteTable,
        cloud_assoc: &cloud::RouteTableAssociation,
        user: &str,
    ) -> Result<RouteTableAssociation> {
        let assoc = RouteTableAssociation {
            route_table_id: table.id.clone(),
            association_type: cloud_assoc.association_type.to_string(),
            ext_associated_resource_id: cloud_assoc.associated_resource_id.clone(),
            associated_resource_id: self.local_resource_id(table, cloud_assoc).await,
            external_id: cloud_assoc.global_id().to_string(),
            ..Default::default()
        };
        let assoc = self.store.insert_association(assoc).await?;
        self.events
            .ops_log(&assoc.object_ref(), ACT_CREATE, &assoc.external_id, user);
        Ok(assoc)
    }

    pub async fn sync_remove_association(&self, assoc: &RouteTableAssociation) -> Result<()> {
        self.store.delete_association(&assoc.id).await
    }
}
