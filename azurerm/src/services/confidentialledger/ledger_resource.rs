//! azurerm_confidential_ledger

use super::client::{
    AadBasedSecurityPrincipal, CertBasedSecurityPrincipal, ConfidentialLedger, LedgerProperties,
};
use super::parse::LedgerId;
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
use tfkit::validator::{OneOfValidator, StringPatternValidator};

const RESOURCE_TYPE: &str = "azurerm_confidential_ledger";

#[derive(Default)]
pub struct ConfidentialLedgerResource {
    clients: Option<clients::Client>,
}

impl ConfidentialLedgerResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn aad_principal_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("principal_id".to_string(), AttributeType::String),
        ("tenant_id".to_string(), AttributeType::String),
        ("ledger_role_name".to_string(), AttributeType::String),
    ]))
}

fn cert_principal_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("pem_public_key".to_string(), AttributeType::String),
        ("ledger_role_name".to_string(), AttributeType::String),
    ]))
}

#[async_trait]
impl Resource for ConfidentialLedgerResource {
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
            .description("Manages a Confidential Ledger")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Confidential Ledger")
                    .required()
                    .force_new()
                    .validator(StringPatternValidator::new(
                        r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,30}[a-zA-Z0-9]$",
                        "ledger names are 3-32 alphanumeric characters, hyphens allowed in the middle",
                    ))
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("ledger_type", AttributeType::String)
                    .description("Whether transaction data is visible to all members (Public) or scoped (Private)")
                    .required()
                    .force_new()
                    .validator(OneOfValidator::new(&["Public", "Private"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "azuread_based_service_principal",
                    AttributeType::List(Box::new(aad_principal_type())),
                )
                .description("AAD principals granted a role on the ledger")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "certificate_based_security_principal",
                    AttributeType::List(Box::new(cert_principal_type())),
                )
                .description("Certificate principals granted a role on the ledger")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("identity_service_endpoint", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ledger_endpoint", AttributeType::String)
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

        let id = LedgerId::new(&clients.subscription_id, &resource_group, &name);

        match clients.confidentialledger.get(&id).await {
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

        let params = expand_ledger(config);
        let written = match clients.confidentialledger.create(&id, &params).await {
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
            new_state: flatten_ledger(&id, &model),
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

        let id = match LedgerId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.confidentialledger.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_ledger(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "ledger was not found - removing from state");
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
            .and_then(|raw| LedgerId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_ledger(&request.planned_state);
        let written = match clients.confidentialledger.update(&id, &params).await {
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
            new_state: flatten_ledger(&id, &model),
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
            .and_then(|raw| LedgerId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.confidentialledger.delete(&id).await {
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

        if let Err(e) = LedgerId::parse(&request.id) {
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
    id: &LedgerId,
    written: Option<ConfidentialLedger>,
    ctx: &Context,
) -> Result<ConfidentialLedger, String> {
    match written {
        Some(model) if provisioning_state(&model) == "Succeeded" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<ConfidentialLedger> = {
        let client = clients.confidentialledger.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let ledger = client.get(&id).await?;
                let state = provisioning_state(&ledger);
                Ok((ledger, state))
            })
        })
    };

    StateChangeConf {
        pending: vec![
            "Creating".to_string(),
            "Provisioning".to_string(),
            "Updating".to_string(),
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

fn provisioning_state(model: &ConfidentialLedger) -> String {
    model
        .properties
        .as_ref()
        .and_then(|p| p.provisioning_state.clone())
        .unwrap_or_default()
}

fn expand_ledger(config: &DynamicValue) -> ConfidentialLedger {
    let aad_principals = config
        .try_get_list(&AttributePath::new("azuread_based_service_principal"))
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let Dynamic::Map(fields) = item else { return None };
                    let get = |key: &str| match fields.get(key) {
                        Some(Dynamic::String(s)) => Some(s.clone()),
                        _ => None,
                    };
                    Some(AadBasedSecurityPrincipal {
                        principal_id: get("principal_id"),
                        tenant_id: get("tenant_id"),
                        ledger_role_name: get("ledger_role_name"),
                    })
                })
                .collect::<Vec<_>>()
        });

    let cert_principals = config
        .try_get_list(&AttributePath::new("certificate_based_security_principal"))
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let Dynamic::Map(fields) = item else { return None };
                    let get = |key: &str| match fields.get(key) {
                        Some(Dynamic::String(s)) => Some(s.clone()),
                        _ => None,
                    };
                    Some(CertBasedSecurityPrincipal {
                        cert: get("pem_public_key"),
                        ledger_role_name: get("ledger_role_name"),
                    })
                })
                .collect::<Vec<_>>()
        });

    ConfidentialLedger {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        properties: Some(LedgerProperties {
            ledger_type: config.try_get_string(&AttributePath::new("ledger_type")),
            aad_based_security_principals: aad_principals,
            cert_based_security_principals: cert_principals,
            ledger_uri: None,
            identity_service_uri: None,
            provisioning_state: None,
        }),
    }
}

fn flatten_ledger(id: &LedgerId, model: &ConfidentialLedger) -> DynamicValue {
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
        &AttributePath::new("ledger_type"),
        props.ledger_type.unwrap_or_default(),
    );

    let aad = props
        .aad_based_security_principals
        .unwrap_or_default()
        .iter()
        .map(|p| {
            Dynamic::Map(HashMap::from([
                (
                    "principal_id".to_string(),
                    Dynamic::String(p.principal_id.clone().unwrap_or_default()),
                ),
                (
                    "tenant_id".to_string(),
                    Dynamic::String(p.tenant_id.clone().unwrap_or_default()),
                ),
                (
                    "ledger_role_name".to_string(),
                    Dynamic::String(p.ledger_role_name.clone().unwrap_or_default()),
                ),
            ]))
        })
        .collect();
    let _ = state.set_list(&AttributePath::new("azuread_based_service_principal"), aad);

    let certs = props
        .cert_based_security_principals
        .unwrap_or_default()
        .iter()
        .map(|p| {
            Dynamic::Map(HashMap::from([
                (
                    "pem_public_key".to_string(),
                    Dynamic::String(p.cert.clone().unwrap_or_default()),
                ),
                (
                    "ledger_role_name".to_string(),
                    Dynamic::String(p.ledger_role_name.clone().unwrap_or_default()),
                ),
            ]))
        })
        .collect();
    let _ = state.set_list(
        &AttributePath::new("certificate_based_security_principal"),
        certs,
    );

    let _ = state.set_string(
        &AttributePath::new("identity_service_endpoint"),
        props.identity_service_uri.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("ledger_endpoint"),
        props.ledger_uri.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const LEDGER_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.ConfidentialLedger/ledgers/ledger1";

    #[test]
    fn expand_maps_aad_principals() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("ledger_type"), "Public".to_string());
        let _ = config.set_list(
            &AttributePath::new("azuread_based_service_principal"),
            vec![Dynamic::Map(HashMap::from([
                (
                    "principal_id".to_string(),
                    Dynamic::String("p-1".to_string()),
                ),
                ("tenant_id".to_string(), Dynamic::String("t-1".to_string())),
                (
                    "ledger_role_name".to_string(),
                    Dynamic::String("Administrator".to_string()),
                ),
            ]))],
        );

        let expanded = expand_ledger(&config);
        let props = expanded.properties.unwrap();
        assert_eq!(props.ledger_type.as_deref(), Some("Public"));
        let principals = props.aad_based_security_principals.unwrap();
        assert_eq!(principals.len(), 1);
        assert_eq!(principals[0].ledger_role_name.as_deref(), Some("Administrator"));
    }

    #[tokio::test]
    async fn create_waits_for_terminal_state_from_put_body() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", LEDGER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", LEDGER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(201)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "properties": {
                        "provisioningState": "Succeeded",
                        "ledgerType": "Public",
                        "ledgerUri": "https://ledger1.confidential-ledger.azure.com",
                        "identityServiceUri": "https://identity.confidential-ledger.core.azure.com/ledgerIdentity/ledger1"
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = ConfidentialLedgerResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "ledger1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_string(&AttributePath::new("ledger_type"), "Public".to_string());

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
                .get_string(&AttributePath::new("ledger_endpoint"))
                .unwrap(),
            "https://ledger1.confidential-ledger.azure.com"
        );
    }

    #[tokio::test]
    async fn read_removes_state_when_gone() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", LEDGER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"gone"}}"#)
            .create_async()
            .await;

        let mut resource = ConfidentialLedgerResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("id"), LEDGER_PATH.to_string());

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

        assert!(response.new_state.is_none());
    }
}
