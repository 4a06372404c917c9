//! Typed client for the Attestation resource provider.

use super::parse::AttestationProviderId;
use crate::api::{ApiError, ArmClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_VERSION: &str = "2020-10-01";

#[derive(Clone)]
pub struct AttestationClient {
    arm: ArmClient,
}

/// GET model for Microsoft.Attestation/attestationProviders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttestationProvider {
    pub location: Option<String>,
    pub tags: Option<HashMap<String, String>>,
    pub properties: Option<StatusResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResult {
    #[serde(rename = "trustModel")]
    pub trust_model: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "attestUri")]
    pub attest_uri: Option<String>,
}

/// PUT body; the service takes a creation-params envelope rather than the
/// resource shape itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceCreationParams {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    pub properties: ServiceCreationSpecificParams,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceCreationSpecificParams {
    #[serde(
        rename = "policySigningCertificates",
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_signing_certificates: Option<JsonWebKeySet>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonWebKey {
    pub kty: String,
    pub x5c: Vec<String>,
}

/// PATCH body for tag-only updates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServicePatchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl AttestationClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn get(&self, id: &AttestationProviderId) -> Result<AttestationProvider, ApiError> {
        self.arm.get(&id.to_string(), API_VERSION).await
    }

    pub async fn create(
        &self,
        id: &AttestationProviderId,
        params: &ServiceCreationParams,
    ) -> Result<Option<AttestationProvider>, ApiError> {
        self.arm.put(&id.to_string(), API_VERSION, params).await
    }

    pub async fn update(
        &self,
        id: &AttestationProviderId,
        params: &ServicePatchParams,
    ) -> Result<Option<AttestationProvider>, ApiError> {
        self.arm.patch(&id.to_string(), API_VERSION, params).await
    }

    pub async fn delete(&self, id: &AttestationProviderId) -> Result<(), ApiError> {
        self.arm.delete(&id.to_string(), API_VERSION).await
    }
}
