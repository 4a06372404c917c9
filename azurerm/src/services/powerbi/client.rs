//! Typed client for the Power BI Dedicated resource provider.

use super::parse::CapacityId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2021-01-01";

#[derive(Clone)]
pub struct PowerBiClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedicatedCapacity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<CapacitySku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<CapacityProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacitySku {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administration: Option<CapacityAdministrators>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityAdministrators {
    #[serde(default)]
    pub members: Vec<String>,
}

impl PowerBiClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &CapacityId) -> Result<DedicatedCapacity, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create(
        &self,
        id: &CapacityId,
        params: &DedicatedCapacity,
    ) -> Result<Option<DedicatedCapacity>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn update(
        &self,
        id: &CapacityId,
        params: &DedicatedCapacity,
    ) -> Result<Option<DedicatedCapacity>, ApiError> {
        self.arm.patch(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &CapacityId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
