//! Azure Analysis Services.

pub mod client;
pub mod parse;
pub mod validate;

mod server_resource;

pub use client::AnalysisServicesClient;
pub use server_resource::AnalysisServicesServerResource;
