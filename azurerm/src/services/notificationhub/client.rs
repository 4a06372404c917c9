//! Typed client for the Notification Hubs resource provider.

use super::parse::{NamespaceId, NotificationHubId};
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2017-04-01";

#[derive(Clone)]
pub struct NotificationHubsClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NamespaceProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceProperties {
    #[serde(rename = "namespaceType", skip_serializing_if = "Option::is_none")]
    pub namespace_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(
        rename = "serviceBusEndpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_bus_endpoint: Option<String>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationHub {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NotificationHubProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationHubProperties {
    #[serde(rename = "apnsCredential", skip_serializing_if = "Option::is_none")]
    pub apns_credential: Option<ApnsCredential>,
    #[serde(rename = "gcmCredential", skip_serializing_if = "Option::is_none")]
    pub gcm_credential: Option<GcmCredential>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsCredential {
    pub properties: ApnsCredentialProperties,
}

/// Token-based APNS authentication. `appName` carries the bundle ID and
/// `appId` the team ID, matching the service's own (mis)naming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsCredentialProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(rename = "appName", skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(rename = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(rename = "keyId", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcmCredential {
    pub properties: GcmCredentialProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcmCredentialProperties {
    #[serde(rename = "googleApiKey", skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,
}

impl NotificationHubsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get_namespace(&self, id: &NamespaceId) -> Result<Namespace, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update_namespace(
        &self,
        id: &NamespaceId,
        params: &Namespace,
    ) -> Result<Option<Namespace>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete_namespace(&self, id: &NamespaceId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }

    pub async fn get_hub(&self, id: &NotificationHubId) -> Result<NotificationHub, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update_hub(
        &self,
        id: &NotificationHubId,
        params: &NotificationHub,
    ) -> Result<Option<NotificationHub>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete_hub(&self, id: &NotificationHubId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
