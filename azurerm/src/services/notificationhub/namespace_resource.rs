//! azurerm_notification_hub_namespace

use super::client::{Namespace, NamespaceProperties, Sku};
use super::parse::NamespaceId;
use crate::clients;
use crate::common;
use crate::poll::{RefreshFn, StateChangeConf};
use crate::tags;
use async_trait::async_trait;
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

const RESOURCE_TYPE: &str = "azurerm_notification_hub_namespace";

#[derive(Default)]
pub struct NotificationHubNamespaceResource {
    clients: Option<clients::Client>,
}

impl NotificationHubNamespaceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for NotificationHubNamespaceResource {
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
            .description("Manages a Notification Hub Namespace")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the namespace")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("namespace_type", AttributeType::String)
                    .description("Whether the namespace is used for Notification Hubs or Messaging")
                    .required()
                    .force_new()
                    .validator(OneOfValidator::new(&["NotificationHub", "Messaging"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sku_name", AttributeType::String)
                    .description("The namespace SKU")
                    .required()
                    .validator(OneOfValidator::new(&["Free", "Basic", "Standard"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .description("Whether the namespace is enabled")
                    .optional()
                    .default_value(Dynamic::Bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("servicebus_endpoint", AttributeType::String)
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

        let id = NamespaceId::new(&clients.subscription_id, &resource_group, &name);

        match clients.notificationhub.get_namespace(&id).await {
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

        let params = expand_namespace(&request.planned_state);
        let written = match clients
            .notificationhub
            .create_or_update_namespace(&id, &params)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        // Namespaces are eventually consistent after create; wait until the
        // provisioning state settles before reading attributes.
        let model = match wait_for_namespace(clients, &id, written, &ctx).await {
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
            new_state: flatten_namespace(&id, &model),
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

        let id = match NamespaceId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.notificationhub.get_namespace(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_namespace(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "namespace was not found - removing from state");
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
            .and_then(|raw| NamespaceId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_namespace(&request.planned_state);
        let written = match clients
            .notificationhub
            .create_or_update_namespace(&id, &params)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_namespace(clients, &id, written, &ctx).await {
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
            new_state: flatten_namespace(&id, &model),
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
            .and_then(|raw| NamespaceId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.notificationhub.delete_namespace(&id).await {
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

        if let Err(e) = NamespaceId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

async fn wait_for_namespace(
    clients: &clients::Client,
    id: &NamespaceId,
    written: Option<Namespace>,
    ctx: &Context,
) -> Result<Namespace, String> {
    match written {
        Some(model) if provisioning_state(&model) == "Succeeded" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<Namespace> = {
        let client = clients.notificationhub.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let namespace = client.get_namespace(&id).await?;
                let state = provisioning_state(&namespace);
                Ok((namespace, state))
            })
        })
    };

    StateChangeConf {
        pending: vec!["".to_string(), "Created".to_string(), "Updating".to_string()],
        target: vec!["Succeeded".to_string()],
        refresh,
        delay: Duration::from_secs(10),
        poll_interval: Duration::from_secs(10),
        timeout: Duration::from_secs(30 * 60),
        not_found_checks: 5,
    }
    .wait_for_state(ctx)
    .await
    .map_err(|e| e.to_string())
}

fn provisioning_state(model: &Namespace) -> String {
    model
        .properties
        .as_ref()
        .and_then(|p| p.provisioning_state.clone())
        .unwrap_or_default()
}

fn expand_namespace(config: &DynamicValue) -> Namespace {
    Namespace {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        sku: config
            .try_get_string(&AttributePath::new("sku_name"))
            .map(|name| Sku { name }),
        tags: tags::expand(config),
        properties: Some(NamespaceProperties {
            namespace_type: config.try_get_string(&AttributePath::new("namespace_type")),
            enabled: Some(
                config
                    .try_get_bool(&AttributePath::new("enabled"))
                    .unwrap_or(true),
            ),
            service_bus_endpoint: None,
            provisioning_state: None,
        }),
    }
}

fn flatten_namespace(id: &NamespaceId, model: &Namespace) -> DynamicValue {
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
    let _ = state.set_string(
        &AttributePath::new("namespace_type"),
        props.namespace_type.unwrap_or_default(),
    );
    let _ = state.set_bool(
        &AttributePath::new("enabled"),
        props.enabled.unwrap_or(true),
    );
    let _ = state.set_string(
        &AttributePath::new("servicebus_endpoint"),
        props.service_bus_endpoint.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const NAMESPACE_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.NotificationHubs/namespaces/ns-1";

    #[tokio::test]
    async fn create_flattens_servicebus_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", NAMESPACE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", NAMESPACE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "sku": {"name": "Standard"},
                    "properties": {
                        "namespaceType": "NotificationHub",
                        "enabled": true,
                        "provisioningState": "Succeeded",
                        "serviceBusEndpoint": "https://ns-1.servicebus.windows.net:443/"
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = NotificationHubNamespaceResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "ns-1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_string(
            &AttributePath::new("namespace_type"),
            "NotificationHub".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("sku_name"), "Standard".to_string());

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
                .get_string(&AttributePath::new("servicebus_endpoint"))
                .unwrap(),
            "https://ns-1.servicebus.windows.net:443/"
        );
        assert!(response
            .new_state
            .get_bool(&AttributePath::new("enabled"))
            .unwrap());
    }

    #[test]
    fn expand_defaults_enabled_to_true() {
        let config = DynamicValue::empty_object();
        let namespace = expand_namespace(&config);
        assert_eq!(namespace.properties.unwrap().enabled, Some(true));
    }
}
