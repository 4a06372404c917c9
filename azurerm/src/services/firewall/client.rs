//! Typed client for Azure Firewall under the Network resource provider.

use super::parse::FirewallId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2023-11-01";

#[derive(Clone)]
pub struct FirewallClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureFirewall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<AzureFirewallProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureFirewallProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<AzureFirewallSku>,
    #[serde(rename = "threatIntelMode", skip_serializing_if = "Option::is_none")]
    pub threat_intel_mode: Option<String>,
    #[serde(rename = "ipConfigurations", skip_serializing_if = "Option::is_none")]
    pub ip_configurations: Option<Vec<AzureFirewallIpConfiguration>>,
    /// Carries the DNS proxy settings as opaque key/value pairs
    /// ("Network.DNS.EnableProxy", "Network.DNS.Servers").
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<HashMap<String, String>>,
    #[serde(
        rename = "applicationRuleCollections",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_rule_collections: Option<Vec<AzureFirewallApplicationRuleCollection>>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureFirewallSku {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureFirewallIpConfiguration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<AzureFirewallIpConfigurationProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureFirewallIpConfigurationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AzureFirewallApplicationRuleCollection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ApplicationRuleCollectionProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRuleCollectionProperties {
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleCollectionAction>,
    #[serde(default)]
    pub rules: Vec<ApplicationRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCollectionAction {
    #[serde(rename = "type")]
    pub action_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "sourceAddresses", default)]
    pub source_addresses: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<ApplicationRuleProtocol>,
    #[serde(rename = "targetFqdns", default)]
    pub target_fqdns: Vec<String>,
    #[serde(rename = "fqdnTags", default)]
    pub fqdn_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRuleProtocol {
    #[serde(rename = "protocolType")]
    pub protocol_type: String,
    pub port: i64,
}

impl FirewallClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &FirewallId) -> Result<AzureFirewall, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        id: &FirewallId,
        params: &AzureFirewall,
    ) -> Result<Option<AzureFirewall>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &FirewallId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
