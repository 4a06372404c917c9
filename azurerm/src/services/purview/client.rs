//! Typed client for the Purview resource provider.

use super::parse::PurviewAccountId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2021-07-01";

#[derive(Clone)]
pub struct PurviewClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurviewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<AccountProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(rename = "principalId", skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountProperties {
    #[serde(
        rename = "publicNetworkAccess",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_network_access: Option<String>,
    #[serde(
        rename = "managedResourceGroupName",
        skip_serializing_if = "Option::is_none"
    )]
    pub managed_resource_group_name: Option<String>,
    #[serde(rename = "managedResources", skip_serializing_if = "Option::is_none")]
    pub managed_resources: Option<ManagedResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<AccountEndpoints>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagedResources {
    #[serde(rename = "storageAccount", skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<String>,
    #[serde(
        rename = "eventHubNamespace",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_hub_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountEndpoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<String>,
}

impl PurviewClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &PurviewAccountId) -> Result<PurviewAccount, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        id: &PurviewAccountId,
        params: &PurviewAccount,
    ) -> Result<Option<PurviewAccount>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &PurviewAccountId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
