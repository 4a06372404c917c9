//! azurerm_lab_service_plan

use super::client::{LabPlan, LabPlanNetworkProfile, LabPlanProperties, SupportInfo};
use super::parse::LabPlanId;
use crate::clients;
use crate::common;
use crate::tags;
use async_trait::async_trait;
use std::collections::HashMap;
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

const RESOURCE_TYPE: &str = "azurerm_lab_service_plan";

#[derive(Default)]
pub struct LabServicePlanResource {
    clients: Option<clients::Client>,
}

impl LabServicePlanResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn support_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("email".to_string(), AttributeType::String),
        ("phone".to_string(), AttributeType::String),
        ("url".to_string(), AttributeType::String),
        ("instructions".to_string(), AttributeType::String),
    ]))
}

#[async_trait]
impl Resource for LabServicePlanResource {
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
            .description("Manages a Lab Service Plan")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Lab Service Plan")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new(
                    "allowed_regions",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Regions labs under this plan may be created in")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("default_network_subnet_id", AttributeType::String)
                    .description("Subnet injected into labs by default")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("support", AttributeType::List(Box::new(support_type())))
                    .description("Support contact information shown to lab users")
                    .optional()
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

        let id = LabPlanId::new(&clients.subscription_id, &resource_group, &name);

        match clients.labservices.get(&id).await {
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

        let params = expand_lab_plan(config);
        let created = match clients.labservices.create_or_update(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.labservices.get(&id).await {
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
            new_state: flatten_lab_plan(&id, &created),
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

        let id = match LabPlanId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.labservices.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_lab_plan(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "lab plan was not found - removing from state");
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
            .and_then(|raw| LabPlanId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_lab_plan(&request.planned_state);
        let model = match clients.labservices.create_or_update(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.labservices.get(&id).await {
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
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        UpdateResourceResponse {
            new_state: flatten_lab_plan(&id, &model),
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
            .and_then(|raw| LabPlanId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.labservices.delete(&id).await {
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

        if let Err(e) = LabPlanId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn expand_lab_plan(config: &DynamicValue) -> LabPlan {
    let allowed_regions = config
        .try_get_list(&AttributePath::new("allowed_regions"))
        .map(|regions| {
            common::expand_string_list(&regions)
                .iter()
                .map(|r| common::normalize_location(r))
                .collect()
        });

    let default_network_profile = config
        .try_get_string(&AttributePath::new("default_network_subnet_id"))
        .map(|subnet_id| LabPlanNetworkProfile {
            subnet_id: Some(subnet_id),
        });

    let support_info = config
        .try_get_list(&AttributePath::new("support"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => {
                let get = |key: &str| match fields.get(key) {
                    Some(Dynamic::String(s)) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                };
                Some(SupportInfo {
                    email: get("email"),
                    phone: get("phone"),
                    url: get("url"),
                    instructions: get("instructions"),
                })
            }
            _ => None,
        });

    LabPlan {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        properties: Some(LabPlanProperties {
            allowed_regions,
            default_network_profile,
            support_info,
            provisioning_state: None,
        }),
    }
}

fn flatten_lab_plan(id: &LabPlanId, model: &LabPlan) -> DynamicValue {
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

    let props = model.properties.clone().unwrap_or_default();
    let _ = state.set_list(
        &AttributePath::new("allowed_regions"),
        common::string_list(&props.allowed_regions.unwrap_or_default()),
    );

    if let Some(subnet_id) = props.default_network_profile.and_then(|p| p.subnet_id) {
        let _ = state.set_string(&AttributePath::new("default_network_subnet_id"), subnet_id);
    }

    let support = props
        .support_info
        .map(|info| {
            vec![Dynamic::Map(HashMap::from([
                (
                    "email".to_string(),
                    Dynamic::String(info.email.unwrap_or_default()),
                ),
                (
                    "phone".to_string(),
                    Dynamic::String(info.phone.unwrap_or_default()),
                ),
                (
                    "url".to_string(),
                    Dynamic::String(info.url.unwrap_or_default()),
                ),
                (
                    "instructions".to_string(),
                    Dynamic::String(info.instructions.unwrap_or_default()),
                ),
            ]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("support"), support);

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const PLAN_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.LabServices/labPlans/plan1";

    #[test]
    fn expand_normalizes_allowed_regions() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_list(
            &AttributePath::new("allowed_regions"),
            vec![
                Dynamic::String("West Europe".to_string()),
                Dynamic::String("uksouth".to_string()),
            ],
        );

        let plan = expand_lab_plan(&config);
        assert_eq!(
            plan.properties.unwrap().allowed_regions.unwrap(),
            vec!["westeurope", "uksouth"]
        );
    }

    #[test]
    fn expand_takes_first_support_block() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_list(
            &AttributePath::new("support"),
            vec![Dynamic::Map(HashMap::from([
                (
                    "email".to_string(),
                    Dynamic::String("help@example.com".to_string()),
                ),
                ("phone".to_string(), Dynamic::String("".to_string())),
            ]))],
        );

        let support = expand_lab_plan(&config)
            .properties
            .unwrap()
            .support_info
            .unwrap();
        assert_eq!(support.email.as_deref(), Some("help@example.com"));
        assert!(support.phone.is_none());
    }

    #[tokio::test]
    async fn create_round_trips_support_info() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", PLAN_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", PLAN_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "properties": {
                        "provisioningState": "Succeeded",
                        "allowedRegions": ["westeurope"],
                        "supportInfo": {"email": "help@example.com", "url": "https://support.example.com"}
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = LabServicePlanResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "plan1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_list(
            &AttributePath::new("allowed_regions"),
            vec![Dynamic::String("westeurope".to_string())],
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
        let support = response
            .new_state
            .get_list(&AttributePath::new("support"))
            .unwrap();
        assert_eq!(support.len(), 1);
    }
}
