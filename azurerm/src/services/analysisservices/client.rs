//! Typed client for the Analysis Services resource provider.

use super::parse::AnalysisServicesServerId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2017-08-01";

#[derive(Clone)]
pub struct AnalysisServicesClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisServicesServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<ResourceSku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ServerProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSku {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerProperties {
    #[serde(rename = "asAdministrators", skip_serializing_if = "Option::is_none")]
    pub as_administrators: Option<ServerAdministrators>,
    #[serde(
        rename = "backupBlobContainerUri",
        skip_serializing_if = "Option::is_none"
    )]
    pub backup_blob_container_uri: Option<String>,
    #[serde(
        rename = "querypoolConnectionMode",
        skip_serializing_if = "Option::is_none"
    )]
    pub querypool_connection_mode: Option<String>,
    #[serde(
        rename = "ipV4FirewallSettings",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_v4_firewall_settings: Option<IpV4FirewallSettings>,
    #[serde(rename = "serverFullName", skip_serializing_if = "Option::is_none")]
    pub server_full_name: Option<String>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerAdministrators {
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpV4FirewallSettings {
    #[serde(rename = "firewallRules", default)]
    pub firewall_rules: Vec<IpV4FirewallRule>,
    #[serde(
        rename = "enablePowerBIService",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_power_bi_service: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpV4FirewallRule {
    #[serde(rename = "firewallRuleName")]
    pub firewall_rule_name: String,
    #[serde(rename = "rangeStart")]
    pub range_start: String,
    #[serde(rename = "rangeEnd")]
    pub range_end: String,
}

impl AnalysisServicesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(
        &self,
        id: &AnalysisServicesServerId,
    ) -> Result<AnalysisServicesServer, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create(
        &self,
        id: &AnalysisServicesServerId,
        params: &AnalysisServicesServer,
    ) -> Result<Option<AnalysisServicesServer>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn update(
        &self,
        id: &AnalysisServicesServerId,
        params: &AnalysisServicesServer,
    ) -> Result<Option<AnalysisServicesServer>, ApiError> {
        self.arm.patch(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &AnalysisServicesServerId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
