//! gRPC service implementation for the Terraform Plugin Protocol.
//!
//! Bridges the protobuf service onto the framework's `Provider`,
//! `Resource` and `DataSource` traits. Resources are created on demand via
//! the provider's factory map and configured with the provider data handle
//! before every operation.
//!
//! Plan semantics implemented here, derived from schema flags alone:
//! optional-and-unset attributes receive their static default, computed
//! attributes with no known value are marked unknown, and changed force-new
//! attributes are reported as requires-replace paths.

use crate::context::Context;
use crate::data_source::{ReadDataSourceRequest, ValidateDataSourceConfigRequest};
use crate::proto;
use crate::provider::{ConfigureProviderRequest, Provider, ValidateProviderConfigRequest};
use crate::resource::{
    CreateResourceRequest, DeleteResourceRequest, ImportResourceStateRequest, ReadResourceRequest,
    Resource, ResourceSchemaRequest, UpdateResourceRequest, UpgradeResourceStateRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::{Attribute, Schema, StringKind};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Diagnostic,
    DiagnosticSeverity, Dynamic, DynamicValue, RawState,
};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tonic::{Request, Response, Status};

pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<Option<Arc<dyn Any + Send + Sync>>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Signalled after StopProvider so the transport can drain and exit.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    async fn new_resource(&self, type_name: &str, ctx: &Context) -> Result<Box<dyn Resource>, Vec<Diagnostic>> {
        let factories = self.provider.read().await.resources();
        let factory = factories.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown resource type",
                format!("this provider does not define {}", type_name),
            )]
        })?;

        let mut resource = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(
                ctx.clone(),
                crate::resource::ConfigureResourceRequest { provider_data },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn new_data_source(
        &self,
        type_name: &str,
        ctx: &Context,
    ) -> Result<Box<dyn crate::data_source::DataSource>, Vec<Diagnostic>> {
        let factories = self.provider.read().await.data_sources();
        let factory = factories.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown data source type",
                format!("this provider does not define {}", type_name),
            )]
        })?;

        let mut data_source = factory();
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(
                ctx.clone(),
                crate::data_source::ConfigureDataSourceRequest { provider_data },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::ProviderService for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> Result<Response<proto::get_metadata::Response>, Status> {
        let provider = self.provider.read().await;

        let resources = provider
            .resources()
            .into_keys()
            .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
            .collect();
        let data_sources = provider
            .data_sources()
            .into_keys()
            .map(|type_name| proto::get_metadata::DataSourceMetadata { type_name })
            .collect();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            data_sources,
            resources,
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> Result<Response<proto::get_provider_schema::Response>, Status> {
        let ctx = Context::new();
        let provider = self.provider.read().await;

        let schema_response = provider
            .schema(ctx.clone(), crate::provider::ProviderSchemaRequest)
            .await;
        let mut diagnostics = schema_response.diagnostics;

        let mut resource_schemas = std::collections::HashMap::new();
        for (type_name, factory) in provider.resources() {
            let resource = factory();
            let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(type_name, schema_to_proto(&response.schema));
        }

        let mut data_source_schemas = std::collections::HashMap::new();
        for (type_name, factory) in provider.data_sources() {
            let data_source = factory();
            let response = data_source
                .schema(ctx.clone(), crate::data_source::DataSourceSchemaRequest)
                .await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(type_name, schema_to_proto(&response.schema));
        }

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&schema_response.schema)),
            resource_schemas,
            data_source_schemas,
            diagnostics: diagnostics_to_proto(diagnostics),
            provider_meta: None,
            server_capabilities: Some(server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> Result<Response<proto::validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let config = decode_value(&req.config)?;

        let provider = self.provider.read().await;
        let schema = provider
            .schema(ctx.clone(), crate::provider::ProviderSchemaRequest)
            .await
            .schema;

        let mut diagnostics = validate_against_schema(&schema, &config);
        if !has_errors(&diagnostics) {
            let response = provider
                .validate(ctx, ValidateProviderConfigRequest { config })
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> Result<Response<proto::validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let config = decode_value(&req.config)?;

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::validate_resource_config::Response {
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };

        let schema = resource.schema(ctx.clone(), ResourceSchemaRequest).await.schema;
        let mut diagnostics = validate_against_schema(&schema, &config);
        if !has_errors(&diagnostics) {
            let response = resource
                .validate(
                    ctx,
                    ValidateResourceConfigRequest {
                        type_name: req.type_name,
                        config,
                        client_capabilities: capabilities_from_proto(&req.client_capabilities),
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> Result<Response<proto::validate_data_resource_config::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let config = decode_value(&req.config)?;

        let data_source = match self.new_data_source(&req.type_name, &ctx).await {
            Ok(data_source) => data_source,
            Err(diags) => {
                return Ok(Response::new(
                    proto::validate_data_resource_config::Response {
                        diagnostics: diagnostics_to_proto(diags),
                    },
                ))
            }
        };

        let schema = data_source
            .schema(ctx.clone(), crate::data_source::DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_against_schema(&schema, &config);
        if !has_errors(&diagnostics) {
            let response = data_source
                .validate(
                    ctx,
                    ValidateDataSourceConfigRequest {
                        type_name: req.type_name,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(
            proto::validate_data_resource_config::Response {
                diagnostics: diagnostics_to_proto(diagnostics),
            },
        ))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::upgrade_resource_state::Response {
                    upgraded_state: None,
                    diagnostics: diagnostics_to_proto(diags),
                }))
            }
        };

        let raw_state = req.raw_state.unwrap_or_default();
        let current_version = resource.schema(ctx.clone(), ResourceSchemaRequest).await.schema.version;

        // Same version: the stored json decodes directly under the current
        // schema.
        if req.version == current_version {
            let state = match &raw_state.json {
                json if !json.is_empty() => DynamicValue::decode_json(json)
                    .map_err(|e| Status::invalid_argument(e.to_string()))?,
                _ => DynamicValue::null(),
            };
            return Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: Some(encode_value(&state)?),
                diagnostics: vec![],
            }));
        }

        let response = resource
            .upgrade_state(
                ctx,
                UpgradeResourceStateRequest {
                    type_name: req.type_name,
                    version: req.version,
                    raw_state: RawState {
                        json: (!raw_state.json.is_empty()).then(|| raw_state.json.clone()),
                        flatmap: (!raw_state.flatmap.is_empty()).then(|| raw_state.flatmap.clone()),
                    },
                },
            )
            .await;

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(encode_value(&response.upgraded_state)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> Result<Response<proto::configure_provider::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let config = decode_value(&req.config)?;

        tracing::debug!(
            request_id = %ctx.request_id(),
            terraform_version = %req.terraform_version,
            "configuring provider"
        );

        let response = self
            .provider
            .write()
            .await
            .configure(
                ctx,
                ConfigureProviderRequest {
                    terraform_version: req.terraform_version,
                    config,
                    client_capabilities: capabilities_from_proto(&req.client_capabilities),
                },
            )
            .await;

        *self.provider_data.write().await = response.provider_data;

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> Result<Response<proto::read_resource::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let current_state = decode_value(&req.current_state)?;

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::read_resource::Response {
                    new_state: req.current_state,
                    diagnostics: diagnostics_to_proto(diags),
                    private: req.private,
                    deferred: None,
                }))
            }
        };

        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: req.type_name,
                    current_state,
                    client_capabilities: capabilities_from_proto(&req.client_capabilities),
                },
            )
            .await;

        let new_state = match response.new_state {
            Some(state) => encode_value(&state)?,
            None => encode_value(&DynamicValue::null())?,
        };

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(new_state),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            private: req.private,
            deferred: None,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> Result<Response<proto::plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();

        let prior = decode_value(&req.prior_state)?;
        let proposed = decode_value(&req.proposed_new_state)?;
        let config = decode_value(&req.config)?;

        // Destroy plans pass through.
        if proposed.is_null() {
            return Ok(Response::new(proto::plan_resource_change::Response {
                planned_state: Some(encode_value(&proposed)?),
                requires_replace: vec![],
                planned_private: req.prior_private,
                diagnostics: vec![],
                legacy_type_system: false,
                deferred: None,
            }));
        }

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::plan_resource_change::Response {
                    planned_state: req.proposed_new_state,
                    requires_replace: vec![],
                    planned_private: req.prior_private,
                    diagnostics: diagnostics_to_proto(diags),
                    legacy_type_system: false,
                    deferred: None,
                }))
            }
        };

        let schema = resource.schema(ctx, ResourceSchemaRequest).await.schema;
        let (planned, requires_replace) = plan_with_schema(&schema, &prior, &proposed, &config)
            .map_err(|e| Status::internal(e.to_string()))?;

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_value(&planned)?),
            requires_replace: requires_replace.iter().map(path_to_proto).collect(),
            planned_private: req.prior_private,
            diagnostics: vec![],
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> Result<Response<proto::apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();

        let prior = decode_value(&req.prior_state)?;
        let planned = decode_value(&req.planned_state)?;
        let config = decode_value(&req.config)?;

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::apply_resource_change::Response {
                    new_state: req.prior_state,
                    private: req.planned_private,
                    diagnostics: diagnostics_to_proto(diags),
                    legacy_type_system: false,
                }))
            }
        };

        let (new_state, diagnostics) = if planned.is_null() {
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: req.type_name,
                        prior_state: prior,
                    },
                )
                .await;
            (DynamicValue::null(), response.diagnostics)
        } else if prior.is_null() {
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: req.type_name,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            (response.new_state, response.diagnostics)
        } else {
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: req.type_name,
                        prior_state: prior,
                        planned_state: planned,
                        config,
                    },
                )
                .await;
            (response.new_state, response.diagnostics)
        };

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_value(&new_state)?),
            private: req.planned_private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> Result<Response<proto::import_resource_state::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();

        let resource = match self.new_resource(&req.type_name, &ctx).await {
            Ok(resource) => resource,
            Err(diags) => {
                return Ok(Response::new(proto::import_resource_state::Response {
                    imported_resources: vec![],
                    diagnostics: diagnostics_to_proto(diags),
                    deferred: None,
                }))
            }
        };

        let response = resource
            .import_state(
                ctx,
                ImportResourceStateRequest {
                    type_name: req.type_name,
                    id: req.id,
                    client_capabilities: capabilities_from_proto(&req.client_capabilities),
                },
            )
            .await;

        let mut imported_resources = Vec::with_capacity(response.imported_resources.len());
        for imported in response.imported_resources {
            imported_resources.push(proto::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: Some(encode_value(&imported.state)?),
                private: vec![],
            });
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> Result<Response<proto::read_data_source::Response>, Status> {
        let req = request.into_inner();
        let ctx = Context::new();
        let config = decode_value(&req.config)?;

        let data_source = match self.new_data_source(&req.type_name, &ctx).await {
            Ok(data_source) => data_source,
            Err(diags) => {
                return Ok(Response::new(proto::read_data_source::Response {
                    state: None,
                    diagnostics: diagnostics_to_proto(diags),
                    deferred: None,
                }))
            }
        };

        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: req.type_name,
                    config,
                    client_capabilities: capabilities_from_proto(&req.client_capabilities),
                },
            )
            .await;

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_value(&response.state)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> Result<Response<proto::stop_provider::Response>, Status> {
        let error = self
            .provider
            .read()
            .await
            .stop(Context::new())
            .await
            .unwrap_or_default();

        let _ = self.shutdown_tx.send(true);

        Ok(Response::new(proto::stop_provider::Response { error }))
    }
}

/// Plan a change from schema flags: defaults, computed-unknown marking and
/// force-new detection.
pub(crate) fn plan_with_schema(
    schema: &Schema,
    prior: &DynamicValue,
    proposed: &DynamicValue,
    config: &DynamicValue,
) -> crate::error::Result<(DynamicValue, Vec<AttributePath>)> {
    let mut planned = proposed.clone();
    let is_create = prior.is_null();
    let mut requires_replace = Vec::new();

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let config_value = config.value_at(&path);
        let planned_value = planned.value_at(&path);

        if attr.optional && matches!(config_value, Dynamic::Null) {
            if let (Some(default), Dynamic::Null) = (&attr.default, &planned_value) {
                planned.set_value(&path, default.clone())?;
                continue;
            }
        }

        if attr.computed
            && matches!(config_value, Dynamic::Null)
            && matches!(planned_value, Dynamic::Null)
        {
            // Value only known after apply; prior values are already merged
            // into the proposed state by Terraform core.
            planned.set_value(&path, Dynamic::Unknown)?;
            continue;
        }

        if attr.force_new && !is_create {
            let prior_value = prior.value_at(&path);
            let new_value = planned.value_at(&path);
            if !matches!(new_value, Dynamic::Unknown) && new_value != prior_value {
                requires_replace.push(path);
            }
        }
    }

    Ok((planned, requires_replace))
}

/// Schema-driven config validation: required attributes must be present,
/// attribute validators run on known values.
pub(crate) fn validate_against_schema(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if config.is_null() {
        return diagnostics;
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = config.value_at(&path);

        if attr.required && matches!(value, Dynamic::Null) {
            diagnostics.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required.", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if matches!(value, Dynamic::Null | Dynamic::Unknown) {
            continue;
        }

        for validator in &attr.validators {
            validator.validate(&value, &path, &mut diagnostics);
        }
    }

    diagnostics
}

fn server_capabilities() -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

fn decode_value(value: &Option<proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };

    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
    } else if !value.json.is_empty() {
        DynamicValue::decode_json(&value.json)
    } else {
        return Ok(DynamicValue::null());
    };

    decoded.map_err(|e| Status::invalid_argument(e.to_string()))
}

fn encode_value(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    Ok(proto::DynamicValue {
        msgpack: value
            .encode_msgpack()
            .map_err(|e| Status::internal(e.to_string()))?,
        json: vec![],
    })
}

fn capabilities_from_proto(capabilities: &Option<proto::ClientCapabilities>) -> ClientCapabilities {
    match capabilities {
        Some(c) => ClientCapabilities {
            deferral_allowed: c.deferral_allowed,
            write_only_attributes_allowed: c.write_only_attributes_allowed,
        },
        None => ClientCapabilities::default(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid as i32,
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail,
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => {
                        proto::attribute_path::step::Selector::AttributeName(name.clone())
                    }
                    AttributePathStep::ElementKeyString(key) => {
                        proto::attribute_path::step::Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => {
                        proto::attribute_path::step::Selector::ElementKeyInt(*idx)
                    }
                }),
            })
            .collect(),
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(proto::schema::Block {
            version: schema.block.version,
            attributes: schema.block.attributes.iter().map(attribute_to_proto).collect(),
            block_types: vec![],
            description: schema.block.description.clone(),
            description_kind: string_kind_to_proto(schema.block.description_kind),
            deprecated: schema.block.deprecated,
        }),
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.to_json().to_string().into_bytes(),
        nested_type: None,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: string_kind_to_proto(StringKind::Plain),
        deprecated: attr.deprecated,
        write_only: false,
    }
}

fn string_kind_to_proto(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

    fn test_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sku_name", AttributeType::String)
                    .optional()
                    .default_value(Dynamic::String("Basic".to_string()))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .optional()
                    .build(),
            )
            .build()
    }

    fn object(pairs: &[(&str, Dynamic)]) -> DynamicValue {
        let mut value = DynamicValue::empty_object();
        for (name, v) in pairs {
            value.set_value(&AttributePath::new(name), v.clone()).unwrap();
        }
        value
    }

    #[test]
    fn plan_marks_computed_unknown_on_create() {
        let schema = test_schema();
        let config = object(&[("name", Dynamic::String("demo".into()))]);
        let proposed = config.clone();

        let (planned, replace) =
            plan_with_schema(&schema, &DynamicValue::null(), &proposed, &config).unwrap();

        assert_eq!(planned.value_at(&AttributePath::new("id")), Dynamic::Unknown);
        assert!(replace.is_empty());
    }

    #[test]
    fn plan_applies_static_defaults() {
        let schema = test_schema();
        let config = object(&[("name", Dynamic::String("demo".into()))]);

        let (planned, _) =
            plan_with_schema(&schema, &DynamicValue::null(), &config.clone(), &config).unwrap();

        assert_eq!(
            planned.value_at(&AttributePath::new("sku_name")),
            Dynamic::String("Basic".to_string())
        );
    }

    #[test]
    fn plan_keeps_prior_computed_value_on_update() {
        let schema = test_schema();
        let prior = object(&[
            ("id", Dynamic::String("/subscriptions/s/x".into())),
            ("name", Dynamic::String("demo".into())),
        ]);
        // Core merges prior computed values into the proposed state.
        let proposed = prior.clone();
        let config = object(&[("name", Dynamic::String("demo".into()))]);

        let (planned, replace) = plan_with_schema(&schema, &prior, &proposed, &config).unwrap();

        assert_eq!(
            planned.value_at(&AttributePath::new("id")),
            Dynamic::String("/subscriptions/s/x".to_string())
        );
        assert!(replace.is_empty());
    }

    #[test]
    fn plan_flags_force_new_changes() {
        let schema = test_schema();
        let prior = object(&[
            ("id", Dynamic::String("old-id".into())),
            ("name", Dynamic::String("before".into())),
        ]);
        let config = object(&[("name", Dynamic::String("after".into()))]);
        let mut proposed = config.clone();
        proposed
            .set_string(&AttributePath::new("id"), "old-id".to_string())
            .unwrap();

        let (_, replace) = plan_with_schema(&schema, &prior, &proposed, &config).unwrap();

        assert_eq!(replace, vec![AttributePath::new("name")]);
    }

    #[test]
    fn validate_reports_missing_required() {
        let schema = test_schema();
        let config = object(&[("enabled", Dynamic::Bool(true))]);

        let diags = validate_against_schema(&schema, &config);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("\"name\" is required"));
    }

    #[test]
    fn validate_skips_unknown_values() {
        let schema = test_schema();
        let config = object(&[("name", Dynamic::Unknown)]);

        // Unknown satisfies required during plan; validators don't run on it.
        assert!(validate_against_schema(&schema, &config).is_empty());
    }
}
