//! The per-service client aggregate handed to every resource and data
//! source as provider data.

use crate::api::ArmClient;
use crate::services::analysisservices::AnalysisServicesClient;
use crate::services::attestation::AttestationClient;
use crate::services::confidentialledger::ConfidentialLedgerClient;
use crate::services::domainservices::DomainServicesClient;
use crate::services::firewall::FirewallClient;
use crate::services::labservices::LabServicesClient;
use crate::services::msi::ManagedIdentityClient;
use crate::services::notificationhub::NotificationHubsClient;
use crate::services::powerbi::PowerBiClient;
use crate::services::purview::PurviewClient;

/// Cheap to clone: every service client shares the one underlying
/// `ArmClient`.
#[derive(Clone)]
pub struct Client {
    pub subscription_id: String,

    pub analysisservices: AnalysisServicesClient,
    pub attestation: AttestationClient,
    pub confidentialledger: ConfidentialLedgerClient,
    pub domainservices: DomainServicesClient,
    pub firewall: FirewallClient,
    pub labservices: LabServicesClient,
    pub msi: ManagedIdentityClient,
    pub notificationhub: NotificationHubsClient,
    pub powerbi: PowerBiClient,
    pub purview: PurviewClient,
}

impl Client {
    pub fn new(arm: ArmClient, subscription_id: String) -> Self {
        Self {
            subscription_id,
            analysisservices: AnalysisServicesClient::new(arm.clone()),
            attestation: AttestationClient::new(arm.clone()),
            confidentialledger: ConfidentialLedgerClient::new(arm.clone()),
            domainservices: DomainServicesClient::new(arm.clone()),
            firewall: FirewallClient::new(arm.clone()),
            labservices: LabServicesClient::new(arm.clone()),
            msi: ManagedIdentityClient::new(arm.clone()),
            notificationhub: NotificationHubsClient::new(arm.clone()),
            powerbi: PowerBiClient::new(arm.clone()),
            purview: PurviewClient::new(arm),
        }
    }
}
