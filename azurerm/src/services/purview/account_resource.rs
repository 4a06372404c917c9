//! azurerm_purview_account

use super::client::{AccountProperties, Identity, PurviewAccount};
use super::parse::PurviewAccountId;
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
use tfkit::validator::StringPatternValidator;

const RESOURCE_TYPE: &str = "azurerm_purview_account";

#[derive(Default)]
pub struct PurviewAccountResource {
    clients: Option<clients::Client>,
}

impl PurviewAccountResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for PurviewAccountResource {
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
            .description("Manages a Purview Account")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Purview Account")
                    .required()
                    .force_new()
                    .validator(StringPatternValidator::new(
                        r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9]$",
                        "account names are 3-63 alphanumeric characters, hyphens allowed in the middle",
                    ))
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("public_network_enabled", AttributeType::Bool)
                    .description("Whether the account is reachable over public networks")
                    .optional()
                    .default_value(Dynamic::Bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("managed_resource_group_name", AttributeType::String)
                    .description("Resource group holding the managed storage and event hub")
                    .optional()
                    .computed()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("catalog_endpoint", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("guardian_endpoint", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("scan_endpoint", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("managed_storage_account_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("managed_event_hub_namespace_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("identity_principal_id", AttributeType::String)
                    .description("Principal ID of the system assigned identity")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("identity_tenant_id", AttributeType::String)
                    .description("Tenant ID of the system assigned identity")
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

        let id = PurviewAccountId::new(&clients.subscription_id, &resource_group, &name);

        match clients.purview.get(&id).await {
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

        let params = expand_account(&request.planned_state);
        let written = match clients.purview.create_or_update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_provisioning(clients, &id, written, &ctx).await {
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
            new_state: flatten_account(&id, &model),
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

        let id = match PurviewAccountId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.purview.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_account(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "account was not found - removing from state");
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
            .and_then(|raw| PurviewAccountId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_account(&request.planned_state);
        let written = match clients.purview.create_or_update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_provisioning(clients, &id, written, &ctx).await {
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
            new_state: flatten_account(&id, &model),
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
            .and_then(|raw| PurviewAccountId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.purview.delete(&id).await {
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

        if let Err(e) = PurviewAccountId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

async fn wait_for_provisioning(
    clients: &clients::Client,
    id: &PurviewAccountId,
    written: Option<PurviewAccount>,
    ctx: &Context,
) -> Result<PurviewAccount, String> {
    match written {
        Some(model) if provisioning_state(&model) == "Succeeded" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<PurviewAccount> = {
        let client = clients.purview.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let account = client.get(&id).await?;
                let state = provisioning_state(&account);
                Ok((account, state))
            })
        })
    };

    StateChangeConf {
        pending: vec![
            "Creating".to_string(),
            "Provisioning".to_string(),
            "Updating".to_string(),
            "Moving".to_string(),
        ],
        target: vec!["Succeeded".to_string()],
        refresh,
        delay: Duration::from_secs(10),
        poll_interval: Duration::from_secs(15),
        timeout: Duration::from_secs(30 * 60),
        not_found_checks: 3,
    }
    .wait_for_state(ctx)
    .await
    .map_err(|e| e.to_string())
}

fn provisioning_state(model: &PurviewAccount) -> String {
    model
        .properties
        .as_ref()
        .and_then(|p| p.provisioning_state.clone())
        .unwrap_or_default()
}

fn expand_account(config: &DynamicValue) -> PurviewAccount {
    let public_network_access = match config
        .try_get_bool(&AttributePath::new("public_network_enabled"))
        .unwrap_or(true)
    {
        true => "Enabled",
        false => "Disabled",
    };

    PurviewAccount {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        identity: Some(Identity {
            identity_type: "SystemAssigned".to_string(),
            principal_id: None,
            tenant_id: None,
        }),
        properties: Some(AccountProperties {
            public_network_access: Some(public_network_access.to_string()),
            managed_resource_group_name: config
                .try_get_string(&AttributePath::new("managed_resource_group_name")),
            managed_resources: None,
            endpoints: None,
            provisioning_state: None,
        }),
    }
}

fn flatten_account(id: &PurviewAccountId, model: &PurviewAccount) -> DynamicValue {
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
    let _ = state.set_bool(
        &AttributePath::new("public_network_enabled"),
        props.public_network_access.as_deref() != Some("Disabled"),
    );
    let _ = state.set_string(
        &AttributePath::new("managed_resource_group_name"),
        props.managed_resource_group_name.unwrap_or_default(),
    );

    let endpoints = props.endpoints.unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("catalog_endpoint"),
        endpoints.catalog.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("guardian_endpoint"),
        endpoints.guardian.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("scan_endpoint"),
        endpoints.scan.unwrap_or_default(),
    );

    let managed = props.managed_resources.unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("managed_storage_account_id"),
        managed.storage_account.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("managed_event_hub_namespace_id"),
        managed.event_hub_namespace.unwrap_or_default(),
    );

    let identity = model.identity.clone().unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("identity_principal_id"),
        identity.principal_id.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("identity_tenant_id"),
        identity.tenant_id.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const ACCOUNT_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Purview/accounts/purview1";

    #[test]
    fn expand_translates_public_network_flag() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_bool(&AttributePath::new("public_network_enabled"), false);

        let account = expand_account(&config);
        assert_eq!(
            account
                .properties
                .unwrap()
                .public_network_access
                .as_deref(),
            Some("Disabled")
        );
        assert_eq!(account.identity.unwrap().identity_type, "SystemAssigned");
    }

    #[tokio::test]
    async fn create_flattens_endpoints_and_managed_resources() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", ACCOUNT_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", ACCOUNT_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(201)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "identity": {"type": "SystemAssigned", "principalId": "p-1", "tenantId": "t-1"},
                    "properties": {
                        "provisioningState": "Succeeded",
                        "publicNetworkAccess": "Enabled",
                        "managedResourceGroupName": "managed-rg-purview1",
                        "managedResources": {
                            "storageAccount": "/subscriptions/s/resourceGroups/managed-rg/providers/Microsoft.Storage/storageAccounts/sa1",
                            "eventHubNamespace": "/subscriptions/s/resourceGroups/managed-rg/providers/Microsoft.EventHub/namespaces/eh1"
                        },
                        "endpoints": {
                            "catalog": "https://purview1.purview.azure.com/catalog",
                            "guardian": "https://purview1.purview.azure.com/guardian",
                            "scan": "https://purview1.purview.azure.com/scan"
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = PurviewAccountResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "purview1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());

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
                .get_string(&AttributePath::new("catalog_endpoint"))
                .unwrap(),
            "https://purview1.purview.azure.com/catalog"
        );
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("identity_principal_id"))
                .unwrap(),
            "p-1"
        );
        assert!(response
            .new_state
            .get_bool(&AttributePath::new("public_network_enabled"))
            .unwrap());
    }
}
