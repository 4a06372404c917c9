//! azurerm_notification_hub

use super::client::{
    ApnsCredential, ApnsCredentialProperties, GcmCredential, GcmCredentialProperties,
    NotificationHub, NotificationHubProperties,
};
use super::parse::NotificationHubId;
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
    UpdateResourceRequest, UpdateResourceResponse, UpgradeResourceStateRequest,
    UpgradeResourceStateResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

const RESOURCE_TYPE: &str = "azurerm_notification_hub";

const APNS_PRODUCTION_ENDPOINT: &str = "https://api.push.apple.com:443/3/device";
const APNS_SANDBOX_ENDPOINT: &str = "https://api.development.push.apple.com:443/3/device";

#[derive(Default)]
pub struct NotificationHubResource {
    clients: Option<clients::Client>,
}

impl NotificationHubResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apns_credential_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("application_mode".to_string(), AttributeType::String),
        ("bundle_id".to_string(), AttributeType::String),
        ("key_id".to_string(), AttributeType::String),
        ("team_id".to_string(), AttributeType::String),
        ("token".to_string(), AttributeType::String),
    ]))
}

fn gcm_credential_type() -> AttributeType {
    AttributeType::Object(HashMap::from([(
        "api_key".to_string(),
        AttributeType::String,
    )]))
}

#[async_trait]
impl Resource for NotificationHubResource {
    fn type_name(&self) -> &str {
        RESOURCE_TYPE
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        // Version 0 stored the raw APNS endpoint URL; version 1 stores the
        // application_mode it derives from.
        let schema = SchemaBuilder::new()
            .version(1)
            .description("Manages a Notification Hub within a Notification Hub Namespace")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Notification Hub")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("namespace_name", AttributeType::String)
                    .description("The namespace the hub lives in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new(
                    "apns_credential",
                    AttributeType::List(Box::new(apns_credential_type())),
                )
                .description("Token-based credential for Apple Push Notification Service")
                .optional()
                .sensitive()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "gcm_credential",
                    AttributeType::List(Box::new(gcm_credential_type())),
                )
                .description("Credential for Firebase Cloud Messaging (legacy GCM)")
                .optional()
                .sensitive()
                .build(),
            )
            .attribute(common::tags_attribute())
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        // application_mode is constrained here rather than in the nested
        // schema since object members carry no validators of their own.
        if let Some(blocks) = request
            .config
            .try_get_list(&AttributePath::new("apns_credential"))
        {
            for (idx, block) in blocks.iter().enumerate() {
                let Dynamic::Map(fields) = block else { continue };
                if let Some(Dynamic::String(mode)) = fields.get("application_mode") {
                    if mode != "Production" && mode != "Sandbox" {
                        diagnostics.push(
                            Diagnostic::error(
                                "Invalid attribute value",
                                format!(
                                    "expected one of [Production, Sandbox], got {:?}",
                                    mode
                                ),
                            )
                            .with_attribute(
                                AttributePath::new("apns_credential")
                                    .index(idx as i64)
                                    .attribute("application_mode"),
                            ),
                        );
                    }
                }
            }
        }

        ValidateResourceConfigResponse { diagnostics }
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
        let (name, namespace_name, resource_group) = match (
            config.get_string(&AttributePath::new("name")),
            config.get_string(&AttributePath::new("namespace_name")),
            config.get_string(&AttributePath::new("resource_group_name")),
        ) {
            (Ok(name), Ok(ns), Ok(rg)) => (name, ns, rg),
            _ => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "Missing required argument",
                        "`name`, `namespace_name` and `resource_group_name` are required",
                    )],
                }
            }
        };

        let id = NotificationHubId::new(
            &clients.subscription_id,
            &resource_group,
            &namespace_name,
            &name,
        );

        match clients.notificationhub.get_hub(&id).await {
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

        let params = expand_hub(config);
        let created = match clients.notificationhub.create_or_update_hub(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.notificationhub.get_hub(&id).await {
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
            new_state: flatten_hub(&id, &created, config),
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

        let id = match NotificationHubId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.notificationhub.get_hub(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_hub(&id, &model, &request.current_state)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "notification hub was not found - removing from state");
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
            .and_then(|raw| NotificationHubId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let params = expand_hub(&request.planned_state);
        let model = match clients.notificationhub.create_or_update_hub(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.notificationhub.get_hub(&id).await {
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
            new_state: flatten_hub(&id, &model, &request.planned_state),
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
            .and_then(|raw| NotificationHubId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.notificationhub.delete_hub(&id).await {
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

        if let Err(e) = NotificationHubId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }

    async fn upgrade_state(
        &self,
        _ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse {
        if request.version != 0 {
            return UpgradeResourceStateResponse {
                upgraded_state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(
                    "Unable to upgrade resource state",
                    format!("no upgrade path from schema version {}", request.version),
                )],
            };
        }

        let raw = request.raw_state.json.unwrap_or_default();
        let mut state = match DynamicValue::decode_json(&raw) {
            Ok(state) => state,
            Err(e) => {
                return UpgradeResourceStateResponse {
                    upgraded_state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Unable to upgrade resource state",
                        e.to_string(),
                    )],
                }
            }
        };

        // v0 kept the raw `endpoint` inside apns_credential.
        if let Some(blocks) = state.try_get_list(&AttributePath::new("apns_credential")) {
            let upgraded = blocks
                .into_iter()
                .map(|block| match block {
                    Dynamic::Map(mut fields) => {
                        let mode = match fields.remove("endpoint") {
                            Some(Dynamic::String(endpoint))
                                if endpoint == APNS_SANDBOX_ENDPOINT =>
                            {
                                "Sandbox"
                            }
                            _ => "Production",
                        };
                        fields.insert(
                            "application_mode".to_string(),
                            Dynamic::String(mode.to_string()),
                        );
                        Dynamic::Map(fields)
                    }
                    other => other,
                })
                .collect();
            let _ = state.set_list(&AttributePath::new("apns_credential"), upgraded);
        }

        UpgradeResourceStateResponse {
            upgraded_state: state,
            diagnostics: vec![],
        }
    }
}

fn expand_hub(config: &DynamicValue) -> NotificationHub {
    let apns_credential = config
        .try_get_list(&AttributePath::new("apns_credential"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => {
                let get = |key: &str| match fields.get(key) {
                    Some(Dynamic::String(s)) => Some(s.clone()),
                    _ => None,
                };
                let endpoint = match get("application_mode").as_deref() {
                    Some("Sandbox") => APNS_SANDBOX_ENDPOINT,
                    _ => APNS_PRODUCTION_ENDPOINT,
                };
                Some(ApnsCredential {
                    properties: ApnsCredentialProperties {
                        endpoint: Some(endpoint.to_string()),
                        app_name: get("bundle_id"),
                        app_id: get("team_id"),
                        key_id: get("key_id"),
                        token: get("token"),
                    },
                })
            }
            _ => None,
        });

    let gcm_credential = config
        .try_get_list(&AttributePath::new("gcm_credential"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => match fields.get("api_key") {
                Some(Dynamic::String(api_key)) => Some(GcmCredential {
                    properties: GcmCredentialProperties {
                        google_api_key: Some(api_key.clone()),
                    },
                }),
                _ => None,
            },
            _ => None,
        });

    NotificationHub {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        properties: Some(NotificationHubProperties {
            apns_credential,
            gcm_credential,
        }),
    }
}

fn flatten_hub(
    id: &NotificationHubId,
    model: &NotificationHub,
    config: &DynamicValue,
) -> DynamicValue {
    let mut state = DynamicValue::empty_object();
    let _ = state.set_string(&AttributePath::new("id"), id.to_string());
    let _ = state.set_string(&AttributePath::new("name"), id.name.clone());
    let _ = state.set_string(
        &AttributePath::new("namespace_name"),
        id.namespace_name.clone(),
    );
    let _ = state.set_string(
        &AttributePath::new("resource_group_name"),
        id.resource_group.clone(),
    );
    let _ = state.set_string(
        &AttributePath::new("location"),
        common::normalize_location(model.location.as_deref().unwrap_or_default()),
    );

    let props = model.properties.clone().unwrap_or_default();

    let apns = props
        .apns_credential
        .map(|credential| {
            let p = credential.properties;
            let mode = match p.endpoint.as_deref() {
                Some(APNS_SANDBOX_ENDPOINT) => "Sandbox",
                _ => "Production",
            };
            // The token is write-only; keep the configured value.
            let token = config
                .try_get_list(&AttributePath::new("apns_credential"))
                .and_then(|blocks| blocks.into_iter().next())
                .and_then(|block| match block {
                    Dynamic::Map(fields) => match fields.get("token") {
                        Some(Dynamic::String(s)) => Some(s.clone()),
                        _ => None,
                    },
                    _ => None,
                })
                .or(p.token);

            vec![Dynamic::Map(HashMap::from([
                (
                    "application_mode".to_string(),
                    Dynamic::String(mode.to_string()),
                ),
                (
                    "bundle_id".to_string(),
                    Dynamic::String(p.app_name.unwrap_or_default()),
                ),
                (
                    "key_id".to_string(),
                    Dynamic::String(p.key_id.unwrap_or_default()),
                ),
                (
                    "team_id".to_string(),
                    Dynamic::String(p.app_id.unwrap_or_default()),
                ),
                (
                    "token".to_string(),
                    Dynamic::String(token.unwrap_or_default()),
                ),
            ]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("apns_credential"), apns);

    let gcm = props
        .gcm_credential
        .map(|credential| {
            // Same as the APNS token: prefer the configured secret.
            let api_key = config
                .try_get_list(&AttributePath::new("gcm_credential"))
                .and_then(|blocks| blocks.into_iter().next())
                .and_then(|block| match block {
                    Dynamic::Map(fields) => match fields.get("api_key") {
                        Some(Dynamic::String(s)) => Some(s.clone()),
                        _ => None,
                    },
                    _ => None,
                })
                .or(credential.properties.google_api_key);

            vec![Dynamic::Map(HashMap::from([(
                "api_key".to_string(),
                Dynamic::String(api_key.unwrap_or_default()),
            )]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("gcm_credential"), gcm);

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const HUB_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.NotificationHubs/namespaces/ns-1/notificationHubs/hub-1";

    fn apns_block(mode: &str) -> Dynamic {
        Dynamic::Map(HashMap::from([
            (
                "application_mode".to_string(),
                Dynamic::String(mode.to_string()),
            ),
            (
                "bundle_id".to_string(),
                Dynamic::String("com.example.app".to_string()),
            ),
            ("key_id".to_string(), Dynamic::String("key1".to_string())),
            ("team_id".to_string(), Dynamic::String("team1".to_string())),
            ("token".to_string(), Dynamic::String("secret".to_string())),
        ]))
    }

    #[test]
    fn expand_maps_application_mode_to_endpoint() {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_list(
            &AttributePath::new("apns_credential"),
            vec![apns_block("Sandbox")],
        );

        let hub = expand_hub(&config);
        let apns = hub.properties.unwrap().apns_credential.unwrap();
        assert_eq!(apns.properties.endpoint.as_deref(), Some(APNS_SANDBOX_ENDPOINT));
        assert_eq!(apns.properties.app_name.as_deref(), Some("com.example.app"));
        assert_eq!(apns.properties.app_id.as_deref(), Some("team1"));
    }

    #[tokio::test]
    async fn validate_rejects_unknown_application_mode() {
        let resource = NotificationHubResource::new();
        let mut config = DynamicValue::empty_object();
        let _ = config.set_list(
            &AttributePath::new("apns_credential"),
            vec![apns_block("Staging")],
        );

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    config,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].detail.contains("Production"));
    }

    #[tokio::test]
    async fn upgrade_from_v0_maps_endpoint_to_application_mode() {
        let resource = NotificationHubResource::new();

        let v0_state = serde_json::json!({
            "id": HUB_PATH,
            "name": "hub-1",
            "apns_credential": [{
                "endpoint": "https://api.development.push.apple.com:443/3/device",
                "bundle_id": "com.example.app",
                "key_id": "key1",
                "team_id": "team1",
                "token": "secret"
            }]
        });

        let response = resource
            .upgrade_state(
                Context::new(),
                UpgradeResourceStateRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    version: 0,
                    raw_state: tfkit::types::RawState {
                        json: Some(v0_state.to_string().into_bytes()),
                        flatmap: None,
                    },
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let blocks = response
            .upgraded_state
            .get_list(&AttributePath::new("apns_credential"))
            .unwrap();
        let Dynamic::Map(fields) = &blocks[0] else {
            panic!("expected apns_credential object");
        };
        assert_eq!(
            fields.get("application_mode"),
            Some(&Dynamic::String("Sandbox".to_string()))
        );
        assert!(!fields.contains_key("endpoint"));
    }

    #[tokio::test]
    async fn create_preserves_configured_secrets() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", HUB_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        // The API omits credential secrets from responses.
        let _put = server
            .mock("PUT", HUB_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "properties": {
                        "apnsCredential": {
                            "properties": {
                                "endpoint": "https://api.push.apple.com:443/3/device",
                                "appName": "com.example.app",
                                "appId": "team1",
                                "keyId": "key1"
                            }
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = NotificationHubResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "hub-1".to_string());
        let _ = config.set_string(&AttributePath::new("namespace_name"), "ns-1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_list(
            &AttributePath::new("apns_credential"),
            vec![apns_block("Production")],
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
        let apns = response
            .new_state
            .get_list(&AttributePath::new("apns_credential"))
            .unwrap();
        assert_eq!(apns.len(), 1);
        let Dynamic::Map(fields) = &apns[0] else {
            panic!("expected apns_credential object");
        };
        assert_eq!(
            fields.get("token"),
            Some(&Dynamic::String("secret".to_string()))
        );
        assert_eq!(
            fields.get("application_mode"),
            Some(&Dynamic::String("Production".to_string()))
        );
    }
}
