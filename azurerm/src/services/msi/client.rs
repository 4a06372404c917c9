//! Typed client for the Managed Identity resource provider.

use super::parse::UserAssignedIdentityId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2023-01-31";

#[derive(Clone)]
pub struct ManagedIdentityClient {
    arm: ArmClient,
}

/// PUT/GET model for Microsoft.ManagedIdentity/userAssignedIdentities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAssignedIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<UserAssignedIdentityProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAssignedIdentityProperties {
    #[serde(rename = "principalId", skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl ManagedIdentityClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(
        &self,
        id: &UserAssignedIdentityId,
    ) -> Result<UserAssignedIdentity, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        id: &UserAssignedIdentityId,
        params: &UserAssignedIdentity,
    ) -> Result<Option<UserAssignedIdentity>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &UserAssignedIdentityId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
