//! Azure Notification Hubs.

pub mod client;
pub mod parse;

mod hub_resource;
mod namespace_resource;

pub use client::NotificationHubsClient;
pub use hub_resource::NotificationHubResource;
pub use namespace_resource::NotificationHubNamespaceResource;
