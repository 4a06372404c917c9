//! Typed client for the Confidential Ledger resource provider.

use super::parse::LedgerId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2022-05-13";

#[derive(Clone)]
pub struct ConfidentialLedgerClient {
    arm: ArmClient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidentialLedger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<LedgerProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerProperties {
    #[serde(rename = "ledgerType", skip_serializing_if = "Option::is_none")]
    pub ledger_type: Option<String>,
    #[serde(
        rename = "aadBasedSecurityPrincipals",
        skip_serializing_if = "Option::is_none"
    )]
    pub aad_based_security_principals: Option<Vec<AadBasedSecurityPrincipal>>,
    #[serde(
        rename = "certBasedSecurityPrincipals",
        skip_serializing_if = "Option::is_none"
    )]
    pub cert_based_security_principals: Option<Vec<CertBasedSecurityPrincipal>>,
    #[serde(rename = "ledgerUri", skip_serializing_if = "Option::is_none")]
    pub ledger_uri: Option<String>,
    #[serde(
        rename = "identityServiceUri",
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_service_uri: Option<String>,
    #[serde(rename = "provisioningState", skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AadBasedSecurityPrincipal {
    #[serde(rename = "principalId", skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(rename = "tenantId", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "ledgerRoleName", skip_serializing_if = "Option::is_none")]
    pub ledger_role_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertBasedSecurityPrincipal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(rename = "ledgerRoleName", skip_serializing_if = "Option::is_none")]
    pub ledger_role_name: Option<String>,
}

impl ConfidentialLedgerClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &LedgerId) -> Result<ConfidentialLedger, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create(
        &self,
        id: &LedgerId,
        params: &ConfidentialLedger,
    ) -> Result<Option<ConfidentialLedger>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn update(
        &self,
        id: &LedgerId,
        params: &ConfidentialLedger,
    ) -> Result<Option<ConfidentialLedger>, ApiError> {
        self.arm.patch(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &LedgerId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
