//! Typed client for the AAD Domain Services resource provider.

use super::parse::DomainServiceId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2021-05-01";

#[derive(Clone)]
pub struct DomainServicesClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<DomainServiceProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainServiceProperties {
    #[serde(rename = "domainName", skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// "Enabled" or "Disabled" on the wire.
    #[serde(rename = "filteredSync", skip_serializing_if = "Option::is_none")]
    pub filtered_sync: Option<String>,
    #[serde(rename = "replicaSets", skip_serializing_if = "Option::is_none")]
    pub replica_sets: Option<Vec<ReplicaSet>>,
    #[serde(rename = "ldapsSettings", skip_serializing_if = "Option::is_none")]
    pub ldaps_settings: Option<LdapsSettings>,
    #[serde(
        rename = "notificationSettings",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_settings: Option<NotificationSettings>,
    #[serde(
        rename = "domainSecuritySettings",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_security_settings: Option<DomainSecuritySettings>,
    #[serde(rename = "deploymentId", skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSet {
    #[serde(rename = "replicaSetId", skip_serializing_if = "Option::is_none")]
    pub replica_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "subnetId", skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(
        rename = "domainControllerIpAddresses",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_controller_ip_addresses: Option<Vec<String>>,
    #[serde(rename = "serviceStatus", skip_serializing_if = "Option::is_none")]
    pub service_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LdapsSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldaps: Option<String>,
    #[serde(rename = "externalAccess", skip_serializing_if = "Option::is_none")]
    pub external_access: Option<String>,
    #[serde(rename = "pfxCertificate", skip_serializing_if = "Option::is_none")]
    pub pfx_certificate: Option<String>,
    #[serde(
        rename = "pfxCertificatePassword",
        skip_serializing_if = "Option::is_none"
    )]
    pub pfx_certificate_password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(
        rename = "notifyGlobalAdmins",
        skip_serializing_if = "Option::is_none"
    )]
    pub notify_global_admins: Option<String>,
    #[serde(rename = "notifyDcAdmins", skip_serializing_if = "Option::is_none")]
    pub notify_dc_admins: Option<String>,
    #[serde(
        rename = "additionalRecipients",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_recipients: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSecuritySettings {
    #[serde(rename = "ntlmV1", skip_serializing_if = "Option::is_none")]
    pub ntlm_v1: Option<String>,
    #[serde(rename = "tlsV1", skip_serializing_if = "Option::is_none")]
    pub tls_v1: Option<String>,
    #[serde(
        rename = "syncKerberosPasswords",
        skip_serializing_if = "Option::is_none"
    )]
    pub sync_kerberos_passwords: Option<String>,
    #[serde(rename = "syncNtlmPasswords", skip_serializing_if = "Option::is_none")]
    pub sync_ntlm_passwords: Option<String>,
    #[serde(
        rename = "syncOnPremPasswords",
        skip_serializing_if = "Option::is_none"
    )]
    pub sync_on_prem_passwords: Option<String>,
}

impl DomainServicesClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &DomainServiceId) -> Result<DomainService, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        id: &DomainServiceId,
        params: &DomainService,
    ) -> Result<Option<DomainService>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &DomainServiceId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}

/// "Enabled"/"Disabled" tri-state helpers used across the settings blocks.
pub fn bool_to_enabled(value: bool) -> String {
    if value { "Enabled" } else { "Disabled" }.to_string()
}

pub fn enabled_to_bool(value: Option<&str>) -> bool {
    value == Some("Enabled")
}
