//! Platform-side records for route tables and the networks they serve.
//!
//! These mirror rows owned by the resource store. The store itself is a
//! contract (see [`crate::store::ComputeStore`]); nothing here talks to a
//! database.

use anyhow::Result;
use ocm_common::cloudprovider::RouteTableAssociationType;
use ocm_common::CloudError;
use serde::{Deserialize, Serialize};

/// Identifies a record in ops/action logs and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub kind: &'static str,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
    pub external_id: String,
    /// Global id of the cloud region hosting the VPC.
    pub region_external_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub vpc_id: String,
    pub external_id: String,
}

/// A route the user asked for when creating the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub cidr: String,
    pub next_hop_type: String,
    pub next_hop_id: String,
}

/// A route mirrored from the cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableRouteSet {
    pub route_table_id: String,
    pub external_id: String,
    pub route_type: String,
    pub cidr: String,
    pub next_hop_type: String,
    pub next_hop_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: String,
    pub name: String,
    pub status: String,
    pub status_reason: String,
    pub vpc_id: String,
    pub network_id: String,
    pub external_id: String,
    pub routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: "route_table",
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTableAssociation {
    pub id: String,
    pub status: String,
    pub status_reason: String,
    pub route_table_id: String,
    /// `Subnet` or `Router`.
    pub association_type: String,
    /// Platform id of the network or router; empty when unknown.
    pub associated_resource_id: String,
    pub ext_associated_resource_id: String,
    pub external_id: String,
}

impl RouteTableAssociation {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: "route_table_association",
            id: self.id.clone(),
            name: self.id.clone(),
        }
    }

    pub fn kind(&self) -> Result<RouteTableAssociationType> {
        parse_association_type(&self.association_type)
    }
}

pub fn parse_association_type(value: &str) -> Result<RouteTableAssociationType> {
    value.parse().map_err(|_| {
        CloudError::InputParameter(format!("invalid association_type {}", value)).into()
    })
}

/// One entry of a create or batch-create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTableAssociationCreateInput {
    pub route_table_id: String,
    pub association_type: String,
    pub associated_resource_id: String,
    pub ext_associated_resource_id: String,
}
