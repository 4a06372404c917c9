//! Microsoft Purview.

pub mod client;
pub mod parse;

mod account_data_source;
mod account_resource;

pub use account_data_source::PurviewAccountDataSource;
pub use account_resource::PurviewAccountResource;
pub use client::PurviewClient;
