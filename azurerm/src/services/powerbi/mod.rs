//! Power BI Embedded.

pub mod client;
pub mod parse;
pub mod validate;

mod embedded_capacity_resource;

pub use client::PowerBiClient;
pub use embedded_capacity_resource::PowerBiEmbeddedResource;
