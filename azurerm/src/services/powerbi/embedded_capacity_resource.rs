//! azurerm_powerbi_embedded

use super::client::{CapacityAdministrators, CapacityProperties, CapacitySku, DedicatedCapacity};
use super::parse::CapacityId;
use super::validate;
use crate::clients;
use crate::common;
use crate::tags;
use async_trait::async_trait;
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

const RESOURCE_TYPE: &str = "azurerm_powerbi_embedded";

#[derive(Default)]
pub struct PowerBiEmbeddedResource {
    clients: Option<clients::Client>,
}

impl PowerBiEmbeddedResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for PowerBiEmbeddedResource {
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
            .description("Manages a Power BI Embedded capacity")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the capacity")
                    .required()
                    .force_new()
                    .validator(validate::capacity_name())
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("sku_name", AttributeType::String)
                    .description("Capacity SKU, A1 through A6")
                    .required()
                    .validator(validate::sku_name())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "administrators",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("Capacity administrators")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("mode", AttributeType::String)
                    .description("Generation of the capacity")
                    .optional()
                    .force_new()
                    .default_value(Dynamic::String("Gen1".to_string()))
                    .validator(OneOfValidator::new(&["Gen1", "Gen2"]))
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

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
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

        let id = CapacityId::new(&clients.subscription_id, &resource_group, &name);

        match clients.powerbi.get(&id).await {
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

        let params = expand_capacity(&request.planned_state);
        let created = match clients.powerbi.create(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.powerbi.get(&id).await {
                Ok(model) => model,
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        format!("retrieving {} after create", id),
                        e.to_string(),
                    ));
                    return CreateResourceResponse {
                        new_state: request.planned_state,
                        diagnostics,
                    };
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        CreateResourceResponse {
            new_state: flatten_capacity(&id, &created),
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

        let id = match CapacityId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.powerbi.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_capacity(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "capacity was not found - removing from state");
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

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
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
            .and_then(|raw| CapacityId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_capacity(&request.planned_state);
        let updated = match clients.powerbi.update(&id, &params).await {
            Ok(Some(model)) => Some(model),
            Ok(None) => None,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match updated {
            Some(model) => model,
            None => match clients.powerbi.get(&id).await {
                Ok(model) => model,
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        format!("retrieving {} after update", id),
                        e.to_string(),
                    ));
                    return UpdateResourceResponse {
                        new_state: request.prior_state,
                        diagnostics,
                    };
                }
            },
        };

        UpdateResourceResponse {
            new_state: flatten_capacity(&id, &model),
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
            .and_then(|raw| CapacityId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.powerbi.delete(&id).await {
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

        if let Err(e) = CapacityId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn expand_capacity(config: &DynamicValue) -> DedicatedCapacity {
    let administrators = config
        .try_get_list(&AttributePath::new("administrators"))
        .map(|members| CapacityAdministrators {
            members: common::expand_string_list(&members),
        });

    DedicatedCapacity {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        sku: config
            .try_get_string(&AttributePath::new("sku_name"))
            .map(|name| CapacitySku {
                name,
                tier: Some("PBIE_Azure".to_string()),
            }),
        tags: tags::expand(config),
        properties: Some(CapacityProperties {
            administration: administrators,
            mode: config.try_get_string(&AttributePath::new("mode")),
            provisioning_state: None,
        }),
    }
}

fn flatten_capacity(id: &CapacityId, model: &DedicatedCapacity) -> DynamicValue {
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
        &AttributePath::new("sku_name"),
        model.sku.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
    );

    let props = model.properties.clone().unwrap_or_default();
    let _ = state.set_list(
        &AttributePath::new("administrators"),
        common::string_list(&props.administration.map(|a| a.members).unwrap_or_default()),
    );
    let _ = state.set_string(
        &AttributePath::new("mode"),
        props.mode.unwrap_or_else(|| "Gen1".to_string()),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const CAPACITY_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.PowerBIDedicated/capacities/pbi1";

    #[test]
    fn expand_sets_sku_tier() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("sku_name"), "A1".to_string());
        let _ = config.set_list(
            &AttributePath::new("administrators"),
            vec![Dynamic::String("admin@example.com".to_string())],
        );

        let capacity = expand_capacity(&config);
        let sku = capacity.sku.unwrap();
        assert_eq!(sku.name, "A1");
        assert_eq!(sku.tier.as_deref(), Some("PBIE_Azure"));
        assert_eq!(
            capacity
                .properties
                .unwrap()
                .administration
                .unwrap()
                .members,
            vec!["admin@example.com"]
        );
    }

    #[tokio::test]
    async fn create_flattens_administrators() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", CAPACITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", CAPACITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "northeurope",
                    "sku": {"name": "A1", "tier": "PBIE_Azure"},
                    "properties": {
                        "administration": {"members": ["admin@example.com"]},
                        "mode": "Gen2",
                        "provisioningState": "Succeeded"
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = PowerBiEmbeddedResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "pbi1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "North Europe".to_string());
        let _ = config.set_string(&AttributePath::new("sku_name"), "A1".to_string());
        let _ = config.set_string(&AttributePath::new("mode"), "Gen2".to_string());
        let _ = config.set_list(
            &AttributePath::new("administrators"),
            vec![Dynamic::String("admin@example.com".to_string())],
        );

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    planned_state: config.clone(),
                    config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            response
                .new_state
                .get_list(&AttributePath::new("administrators"))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("mode"))
                .unwrap(),
            "Gen2"
        );
    }
}
