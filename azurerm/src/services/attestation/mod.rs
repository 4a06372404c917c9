//! Azure Attestation.

pub mod client;
pub mod parse;
pub mod validate;

mod attestation_provider_data_source;
mod attestation_provider_resource;

pub use attestation_provider_data_source::AttestationProviderDataSource;
pub use attestation_provider_resource::AttestationProviderResource;
pub use client::AttestationClient;
