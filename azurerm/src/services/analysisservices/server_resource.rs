//! azurerm_analysis_services_server

use super::client::{
    AnalysisServicesServer, IpV4FirewallRule, IpV4FirewallSettings, ResourceSku,
    ServerAdministrators, ServerProperties,
};
use super::parse::AnalysisServicesServerId;
use super::validate;
use crate::clients;
use crate::common;
use crate::poll::{RefreshFn, StateChangeConf};
use crate::tags;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tfkit::context::Context;
use tfkit::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfkit::validator::OneOfValidator;

const RESOURCE_TYPE: &str = "azurerm_analysis_services_server";

#[derive(Default)]
pub struct AnalysisServicesServerResource {
    clients: Option<clients::Client>,
}

impl AnalysisServicesServerResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn firewall_rule_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("name".to_string(), AttributeType::String),
        ("range_start".to_string(), AttributeType::String),
        ("range_end".to_string(), AttributeType::String),
    ]))
}

#[async_trait]
impl Resource for AnalysisServicesServerResource {
    fn type_name(&self) -> &str {
        RESOURCE_TYPE
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages an Analysis Services Server")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Analysis Services Server")
                    .required()
                    .force_new()
                    .validator(validate::server_name())
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("sku", AttributeType::String)
                    .description("SKU for the server, e.g. S1")
                    .required()
                    .validator(validate::sku_name())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("admin_users", AttributeType::Set(Box::new(AttributeType::String)))
                    .description("Users to be granted server administrator rights")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enable_power_bi_service", AttributeType::Bool)
                    .description("Allow the Power BI service to access the server")
                    .optional()
                    .default_value(Dynamic::Bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "ipv4_firewall_rule",
                    AttributeType::List(Box::new(firewall_rule_type())),
                )
                .description("IPv4 firewall rules granting access to the server")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("querypool_connection_mode", AttributeType::String)
                    .description("How the read-write server handles query pool connections")
                    .optional()
                    .default_value(Dynamic::String("All".to_string()))
                    .validator(OneOfValidator::new(&["All", "ReadOnly"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("backup_blob_container_uri", AttributeType::String)
                    .description("SAS URI of the blob container used for backups")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("server_full_name", AttributeType::String)
                    .description("The full name of the server for client connections")
                    .computed()
                    .build(),
            )
            .attribute(common::tags_attribute())
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match request
            .provider_data
            .as_ref()
            .and_then(|data| data.downcast_ref::<clients::Client>())
        {
            Some(clients) => self.clients = Some(clients.clone()),
            None => diagnostics.push(common::provider_not_configured()),
        }
        ConfigureResourceResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let Some(clients) = &self.clients else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::provider_not_configured()],
            };
        };

        let config = &request.config;
        let (name, resource_group) = match (
            config.get_string(&AttributePath::new("name")),
            config.get_string(&AttributePath::new("resource_group_name")),
        ) {
            (Ok(name), Ok(rg)) => (name, rg),
            _ => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "Missing required argument",
                        "`name` and `resource_group_name` are required",
                    )],
                }
            }
        };

        let id = AnalysisServicesServerId::new(&clients.subscription_id, &resource_group, &name);

        match clients.analysisservices.get(&id).await {
            Ok(_) => {
                diagnostics.push(common::import_as_exists_error(RESOURCE_TYPE, &id));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
            Err(e) if e.was_not_found() => {}
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("checking for existing {}", id),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        }

        let params = expand_server(&request.planned_state);
        let created = match clients.analysisservices.create(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let model = match finalize_provisioning(clients, &id, created, &ctx).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("waiting for creation of {}", id),
                    e,
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        CreateResourceResponse {
            new_state: flatten_server(&id, &model, &request.planned_state),
            diagnostics,
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some(clients) = &self.clients else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![common::provider_not_configured()],
            };
        };

        let Ok(raw_id) = request.current_state.get_string(&AttributePath::new("id")) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
            };
        };

        let id = match AnalysisServicesServerId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.analysisservices.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_server(&id, &model, &request.current_state)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "server was not found - removing from state");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("retrieving {}", id), e.to_string()));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(clients) = &self.clients else {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::provider_not_configured()],
            };
        };

        let id = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| e.to_string())
            .and_then(|raw| AnalysisServicesServerId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_server(&request.planned_state);
        let updated = match clients.analysisservices.update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match finalize_provisioning(clients, &id, updated, &ctx).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("waiting for update of {}", id), e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        UpdateResourceResponse {
            new_state: flatten_server(&id, &model, &request.planned_state),
            diagnostics,
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(clients) = &self.clients else {
            return DeleteResourceResponse {
                diagnostics: vec![common::provider_not_configured()],
            };
        };

        let id = match request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .map_err(|e| e.to_string())
            .and_then(|raw| AnalysisServicesServerId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.analysisservices.delete(&id).await {
            Ok(()) => {}
            Err(e) if e.was_not_found() => {}
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("deleting {}", id), e.to_string()));
            }
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };

        if let Err(e) = AnalysisServicesServerId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

/// Server writes are long-running; when the write response isn't already
/// terminal, poll the provisioning state to completion.
async fn finalize_provisioning(
    clients: &clients::Client,
    id: &AnalysisServicesServerId,
    written: Option<AnalysisServicesServer>,
    ctx: &Context,
) -> Result<AnalysisServicesServer, String> {
    match written {
        Some(model) if provisioning_state(&model) == "Succeeded" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<AnalysisServicesServer> = {
        let client = clients.analysisservices.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let server = client.get(&id).await?;
                let state = provisioning_state(&server);
                Ok((server, state))
            })
        })
    };

    StateChangeConf {
        pending: vec![
            "Provisioning".to_string(),
            "Preparing".to_string(),
            "Scaling".to_string(),
            "Updating".to_string(),
        ],
        target: vec!["Succeeded".to_string()],
        refresh,
        delay: Duration::from_secs(10),
        poll_interval: Duration::from_secs(10),
        timeout: Duration::from_secs(30 * 60),
        not_found_checks: 3,
    }
    .wait_for_state(ctx)
    .await
    .map_err(|e| e.to_string())
}

fn provisioning_state(model: &AnalysisServicesServer) -> String {
    model
        .properties
        .as_ref()
        .and_then(|p| p.provisioning_state.clone())
        .unwrap_or_default()
}

fn expand_server(config: &DynamicValue) -> AnalysisServicesServer {
    let admin_users = config
        .try_get_list(&AttributePath::new("admin_users"))
        .map(|members| ServerAdministrators {
            members: common::expand_string_list(&members),
        });

    let firewall_rules = config
        .try_get_list(&AttributePath::new("ipv4_firewall_rule"))
        .map(|rules| expand_firewall_rules(&rules))
        .unwrap_or_default();

    let ip_v4_firewall_settings = Some(IpV4FirewallSettings {
        firewall_rules,
        enable_power_bi_service: config.try_get_bool(&AttributePath::new("enable_power_bi_service")),
    });

    AnalysisServicesServer {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        sku: config
            .try_get_string(&AttributePath::new("sku"))
            .map(|name| ResourceSku { name }),
        tags: tags::expand(config),
        properties: Some(ServerProperties {
            as_administrators: admin_users,
            backup_blob_container_uri: config
                .try_get_string(&AttributePath::new("backup_blob_container_uri")),
            querypool_connection_mode: config
                .try_get_string(&AttributePath::new("querypool_connection_mode")),
            ip_v4_firewall_settings,
            server_full_name: None,
            provisioning_state: None,
        }),
    }
}

fn expand_firewall_rules(rules: &[Dynamic]) -> Vec<IpV4FirewallRule> {
    rules
        .iter()
        .filter_map(|rule| {
            let Dynamic::Map(fields) = rule else {
                return None;
            };
            let get = |key: &str| match fields.get(key) {
                Some(Dynamic::String(s)) => s.clone(),
                _ => String::new(),
            };
            Some(IpV4FirewallRule {
                firewall_rule_name: get("name"),
                range_start: get("range_start"),
                range_end: get("range_end"),
            })
        })
        .collect()
}

fn flatten_firewall_rules(rules: &[IpV4FirewallRule]) -> Vec<Dynamic> {
    rules
        .iter()
        .map(|rule| {
            Dynamic::Map(HashMap::from([
                (
                    "name".to_string(),
                    Dynamic::String(rule.firewall_rule_name.clone()),
                ),
                (
                    "range_start".to_string(),
                    Dynamic::String(rule.range_start.clone()),
                ),
                (
                    "range_end".to_string(),
                    Dynamic::String(rule.range_end.clone()),
                ),
            ]))
        })
        .collect()
}

fn flatten_server(
    id: &AnalysisServicesServerId,
    model: &AnalysisServicesServer,
    config: &DynamicValue,
) -> DynamicValue {
    let mut state = DynamicValue::empty_object();
    let _ = state.set_string(&AttributePath::new("id"), id.to_string());
    let _ = state.set_string(&AttributePath::new("name"), id.name.clone());
    let _ = state.set_string(
        &AttributePath::new("resource_group_name"),
        id.resource_group.clone(),
    );
    let _ = state.set_string(
        &AttributePath::new("location"),
        common::normalize_location(model.location.as_deref().unwrap_or_default()),
    );
    let _ = state.set_string(
        &AttributePath::new("sku"),
        model.sku.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
    );

    let props = model.properties.clone().unwrap_or_default();
    let _ = state.set_list(
        &AttributePath::new("admin_users"),
        common::string_list(
            &props
                .as_administrators
                .map(|a| a.members)
                .unwrap_or_default(),
        ),
    );

    let firewall = props.ip_v4_firewall_settings.unwrap_or_default();
    let _ = state.set_bool(
        &AttributePath::new("enable_power_bi_service"),
        firewall.enable_power_bi_service.unwrap_or(false),
    );
    let _ = state.set_list(
        &AttributePath::new("ipv4_firewall_rule"),
        flatten_firewall_rules(&firewall.firewall_rules),
    );

    let _ = state.set_string(
        &AttributePath::new("querypool_connection_mode"),
        props
            .querypool_connection_mode
            .unwrap_or_else(|| "All".to_string()),
    );

    // The SAS URI is write-only in the API; keep the configured value.
    if let Some(uri) = config.try_get_string(&AttributePath::new("backup_blob_container_uri")) {
        let _ = state.set_string(&AttributePath::new("backup_blob_container_uri"), uri);
    }

    let _ = state.set_string(
        &AttributePath::new("server_full_name"),
        props.server_full_name.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}
