//! Managed Service Identity (user assigned identities).

pub mod client;
pub mod parse;

mod user_assigned_identity_data_source;
mod user_assigned_identity_resource;

pub use client::ManagedIdentityClient;
pub use user_assigned_identity_data_source::UserAssignedIdentityDataSource;
pub use user_assigned_identity_resource::UserAssignedIdentityResource;
