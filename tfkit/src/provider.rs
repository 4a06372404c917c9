//! Provider trait: the factory-based root object of a plugin.
//!
//! A provider owns its configuration schema, turns that configuration into
//! an opaque provider-data handle (API clients, credentials), and hands out
//! fresh resource/data-source instances by type name. Instances are created
//! per RPC; shared state lives behind the provider data handle.

use crate::context::Context;
use crate::data_source::DataSource;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::types::{ClientCapabilities, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory producing an unconfigured resource instance.
pub type ResourceFactory = Box<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// Factory producing an unconfigured data source instance.
pub type DataSourceFactory = Box<dyn Fn() -> Box<dyn DataSource> + Send + Sync>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name as used in the required_providers block.
    fn type_name(&self) -> &str;

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Config checks beyond schema flags; runs before `configure`.
    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    /// Build clients from configuration. The returned provider data is
    /// passed to every resource and data source instance.
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    fn resources(&self) -> HashMap<String, ResourceFactory>;

    fn data_sources(&self) -> HashMap<String, DataSourceFactory>;

    /// Called on StopProvider; cancel any in-flight polling.
    async fn stop(&self, _ctx: Context) -> Option<String> {
        None
    }
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ValidateProviderConfigRequest {
    pub config: DynamicValue,
}

pub struct ValidateProviderConfigResponse {
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
    pub client_capabilities: ClientCapabilities,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    /// Opaque handle handed to resources/data sources via their
    /// `configure` calls. `None` when configuration failed.
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}
