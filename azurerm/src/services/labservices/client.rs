//! Typed client for the Lab Services resource provider.

use super::parse::LabPlanId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2022-08-01";

#[derive(Clone)]
pub struct LabServicesClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<LabPlanProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabPlanProperties {
    #[serde(rename = "allowedRegions", skip_serializing_if = "Option::is_none")]
    pub allowed_regions: Option<Vec<String>>,
    #[serde(
        rename = "defaultNetworkProfile",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_network_profile: Option<LabPlanNetworkProfile>,
    #[serde(rename = "supportInfo", skip_serializing_if = "Option::is_none")]
    pub support_info: Option<SupportInfo>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabPlanNetworkProfile {
    #[serde(rename = "subnetId", skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl LabServicesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &LabPlanId) -> Result<LabPlan, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        id: &LabPlanId,
        params: &LabPlan,
    ) -> Result<Option<LabPlan>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &LabPlanId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
