//! Azure Lab Services.

pub mod client;
pub mod parse;

mod lab_service_plan_resource;

pub use client::LabServicesClient;
pub use lab_service_plan_resource::LabServicePlanResource;
