//! Resource Manager plumbing: authentication, the shared HTTP client and
//! the API error type.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::TokenSource;
pub use client::{ArmClient, RetryConfig};
pub use error::ApiError;
