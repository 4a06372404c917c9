//! Protocol buffer types for Terraform Plugin Protocol v6.
//!
//! The message and service definitions live in `proto/tfplugin6.proto` and
//! are compiled by tonic-build. Request/response types are nested in
//! snake_case modules per RPC (e.g. `read_resource::Request`), nested
//! messages in sub-modules (e.g. `diagnostic::Severity`).
//!
//! Several protobuf types share names with framework types (DynamicValue,
//! Diagnostic, AttributePath, Schema); always use the `proto::` prefix for
//! the wire types.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

// Re-export the gRPC service trait and server wrapper.
pub use provider_server::{Provider as ProviderService, ProviderServer};
