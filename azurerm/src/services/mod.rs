//! One module per Resource Manager service. Each follows the same shape:
//! a typed client pinning the service's API version (`client.rs`), typed
//! resource IDs (`parse.rs`), and the resource/data-source implementations.

pub mod analysisservices;
pub mod attestation;
pub mod confidentialledger;
pub mod domainservices;
pub mod firewall;
pub mod labservices;
pub mod msi;
pub mod notificationhub;
pub mod powerbi;
pub mod purview;
