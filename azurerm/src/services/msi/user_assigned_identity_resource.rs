//! azurerm_user_assigned_identity

use super::client::{UserAssignedIdentity, UserAssignedIdentityProperties};
use super::parse::UserAssignedIdentityId;
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
use tfkit::types::{AttributePath, Diagnostic, DynamicValue};
use tfkit::validator::StringPatternValidator;

const RESOURCE_TYPE: &str = "azurerm_user_assigned_identity";

#[derive(Default)]
pub struct UserAssignedIdentityResource {
    clients: Option<clients::Client>,
}

impl UserAssignedIdentityResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for UserAssignedIdentityResource {
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
            .description("Manages a User Assigned Identity")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the identity")
                    .required()
                    .force_new()
                    .validator(StringPatternValidator::new(
                        r"^[a-zA-Z0-9][a-zA-Z0-9-_]{2,127}$",
                        "identity names are 3-128 characters of letters, digits, hyphens and underscores, starting with a letter or digit",
                    ))
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("principal_id", AttributeType::String)
                    .description("The Service Principal ID of the identity")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_id", AttributeType::String)
                    .description("The Client ID of the identity")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tenant_id", AttributeType::String)
                    .description("The Tenant ID of the identity")
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

        let id = UserAssignedIdentityId::new(&clients.subscription_id, &resource_group, &name);

        match clients.msi.get(&id).await {
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

        let params = expand_identity(config);
        let created = match clients.msi.create_or_update(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.msi.get(&id).await {
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
            new_state: flatten_identity(&id, &created),
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

        let id = match UserAssignedIdentityId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.msi.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_identity(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "identity was not found - removing from state");
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
            .and_then(|raw| UserAssignedIdentityId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_identity(&request.planned_state);
        let updated = match clients.msi.create_or_update(&id, &params).await {
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
            None => match clients.msi.get(&id).await {
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
            new_state: flatten_identity(&id, &model),
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
            .and_then(|raw| UserAssignedIdentityId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.msi.delete(&id).await {
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

        if let Err(e) = UserAssignedIdentityId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn expand_identity(config: &DynamicValue) -> UserAssignedIdentity {
    UserAssignedIdentity {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        properties: Some(UserAssignedIdentityProperties::default()),
    }
}

fn flatten_identity(id: &UserAssignedIdentityId, model: &UserAssignedIdentity) -> DynamicValue {
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
    let _ = state.set_string(
        &AttributePath::new("principal_id"),
        props.principal_id.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("client_id"),
        props.client_id.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("tenant_id"),
        props.tenant_id.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};
    use std::collections::HashMap;
    use tfkit::types::Dynamic;

    const IDENTITY_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.ManagedIdentity/userAssignedIdentities/uai-1";

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "uai-1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "West Europe".to_string());
        let _ = config.set_map(
            &AttributePath::new("tags"),
            HashMap::from([("env".to_string(), Dynamic::String("test".to_string()))]),
        );
        config
    }

    async fn resource_for(server: &mockito::Server) -> UserAssignedIdentityResource {
        let mut resource = UserAssignedIdentityResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;
        resource
    }

    #[tokio::test]
    async fn schema_flags() {
        let resource = UserAssignedIdentityResource::new();
        let schema = resource
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;

        assert!(schema.attribute("name").unwrap().force_new);
        assert!(schema.attribute("principal_id").unwrap().computed);
        assert!(schema.attribute("client_id").unwrap().computed);
        assert!(schema.attribute("tags").unwrap().optional);
    }

    #[tokio::test]
    async fn create_puts_and_flattens_computed_fields() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", IDENTITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", IDENTITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(201)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "tags": {"env": "test"},
                    "properties": {
                        "principalId": "11111111-1111-1111-1111-111111111111",
                        "clientId": "22222222-2222-2222-2222-222222222222",
                        "tenantId": "33333333-3333-3333-3333-333333333333"
                    }
                }"#,
            )
            .create_async()
            .await;

        let resource = resource_for(&server).await;
        let config = test_config();
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
        let state = response.new_state;
        assert_eq!(
            state.get_string(&AttributePath::new("id")).unwrap(),
            IDENTITY_PATH
        );
        assert_eq!(
            state.get_string(&AttributePath::new("principal_id")).unwrap(),
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(
            state.get_string(&AttributePath::new("location")).unwrap(),
            "westeurope"
        );
        put.assert_async().await;
    }

    #[tokio::test]
    async fn create_fails_when_identity_already_exists() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", IDENTITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"location":"westeurope"}"#)
            .create_async()
            .await;

        let resource = resource_for(&server).await;
        let config = test_config();
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

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("already exists"));
    }

    #[tokio::test]
    async fn read_removes_state_when_gone() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", IDENTITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"gone"}}"#)
            .create_async()
            .await;

        let resource = resource_for(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("id"), IDENTITY_PATH.to_string());

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    current_state: state,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn delete_tolerates_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", IDENTITY_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"gone"}}"#)
            .create_async()
            .await;

        let resource = resource_for(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("id"), IDENTITY_PATH.to_string());

        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    prior_state: state,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn import_rejects_malformed_ids() {
        let resource = UserAssignedIdentityResource::new();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    id: "not-a-resource-id".to_string(),
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.imported_resources.is_empty());
    }
}
