//! Azure Firewall.

pub mod client;
pub mod parse;
pub mod validate;

mod application_rule_collection_resource;
mod firewall_resource;

pub use application_rule_collection_resource::FirewallApplicationRuleCollectionResource;
pub use client::FirewallClient;
pub use firewall_resource::FirewallResource;

/// Lock namespace shared by the firewall resource and every child resource
/// that rewrites the firewall in place.
pub(crate) const FIREWALL_RESOURCE_NAME: &str = "azureFirewalls";
