//! Server entry point: go-plugin handshake plus the tonic transport.

use crate::error::{Result, TfkitError};
use crate::grpc::GrpcProviderServer;
use crate::proto::ProviderServer;
use crate::provider::Provider;
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Server configuration for running a provider.
///
/// Terraform normally negotiates AutoMTLS; for local development and tests
/// the TLS pair is optional and the server falls back to plaintext.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// Maximum gRPC message size in bytes.
    pub max_message_size: usize,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            max_message_size: 256 << 20, // 256MB, matches terraform-plugin-go
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls(mut self, cert_path: PathBuf, key_path: PathBuf) -> Self {
        self.cert_path = Some(cert_path);
        self.key_path = Some(key_path);
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// TLS pair from `PLUGIN_CERT`/`PLUGIN_KEY` when present.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let (Ok(cert), Ok(key)) = (std::env::var("PLUGIN_CERT"), std::env::var("PLUGIN_KEY")) {
            config = config.with_tls(PathBuf::from(cert), PathBuf::from(key));
        }
        config
    }
}

/// Main entry point for running a provider.
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    // Repeated installs fail harmlessly when a provider binary embeds more
    // than one entry point.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let grpc_server = GrpcProviderServer::new(provider);
    let mut shutdown = grpc_server.shutdown_signal();

    let service = ProviderServer::new(grpc_server)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let mut builder = Server::builder();
    if let (Some(cert_path), Some(key_path)) = (&config.cert_path, &config.key_path) {
        let cert = tokio::fs::read(cert_path)
            .await
            .map_err(|e| TfkitError::TlsError(format!("failed to read certificate: {}", e)))?;
        let key = tokio::fs::read(key_path)
            .await
            .map_err(|e| TfkitError::TlsError(format!("failed to read key: {}", e)))?;
        let identity = Identity::from_pem(cert, key);
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
    }

    // go-plugin handshake: core-version|protocol-version|network|address|protocol
    println!("1|6|tcp|{}|grpc", addr);
    tracing::info!(address = %addr, "provider server listening");

    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    builder
        .add_service(service)
        .serve_with_incoming_shutdown(incoming, async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
            tracing::info!("stop requested, shutting down");
        })
        .await?;

    Ok(())
}

/// Run a provider with default configuration.
pub async fn serve_default<P: Provider + 'static>(provider: P) -> Result<()> {
    serve(provider, ServerConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_plaintext() {
        let config = ServerConfig::default();
        assert!(config.cert_path.is_none());
        assert!(config.key_path.is_none());
        assert_eq!(config.max_message_size, 256 << 20);
    }

    #[test]
    fn with_tls_sets_both_paths() {
        let config = ServerConfig::new().with_tls(
            PathBuf::from("certs/localhost.pem"),
            PathBuf::from("certs/localhost-key.pem"),
        );
        assert!(config.cert_path.is_some());
        assert!(config.key_path.is_some());
    }
}
