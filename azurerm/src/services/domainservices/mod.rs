//! Azure Active Directory Domain Services.

pub mod client;
pub mod parse;

mod domain_service_resource;
mod replica_set_resource;

pub use client::DomainServicesClient;
pub use domain_service_resource::DomainServiceResource;
pub use replica_set_resource::DomainServiceReplicaSetResource;

/// Lock namespace shared by the domain service resource and the replica
/// set resource, which rewrites the parent in place.
pub(crate) const DOMAIN_SERVICE_RESOURCE_NAME: &str = "domainServices";
