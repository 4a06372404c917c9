//! azurerm_attestation_provider

use super::client::{
    JsonWebKey, JsonWebKeySet, ServiceCreationParams, ServiceCreationSpecificParams,
    ServicePatchParams,
};
use super::parse::AttestationProviderId;
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
use tfkit::types::{AttributePath, Diagnostic, DynamicValue};

const RESOURCE_TYPE: &str = "azurerm_attestation_provider";

#[derive(Default)]
pub struct AttestationProviderResource {
    clients: Option<clients::Client>,
}

impl AttestationProviderResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for AttestationProviderResource {
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
            .description("Manages an Attestation Provider")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the attestation provider")
                    .required()
                    .force_new()
                    .validator(validate::attestation_provider_name())
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("policy_signing_certificate_data", AttributeType::String)
                    .description("A PEM encoded X.509 certificate used to sign policies")
                    .optional()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("attestation_uri", AttributeType::String)
                    .description("The URI of the attestation service")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("trust_model", AttributeType::String)
                    .description("The trust model used by the attestation provider")
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

        let id = AttestationProviderId::new(&clients.subscription_id, &resource_group, &name);

        match clients.attestation.get(&id).await {
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

        let params = expand_creation_params(config);
        let created = match clients.attestation.create(&id, &params).await {
            Ok(Some(model)) => model,
            Ok(None) => match clients.attestation.get(&id).await {
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
            new_state: flatten_provider(&id, &created, config),
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

        let id = match AttestationProviderId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.attestation.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_provider(&id, &model, &request.current_state)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "attestation provider was not found - removing from state");
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
            .and_then(|raw| AttestationProviderId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        // Only tags are updatable in place; everything else is force-new.
        let patch = ServicePatchParams {
            tags: tags::expand(&request.planned_state),
        };
        if let Err(e) = clients.attestation.update(&id, &patch).await {
            diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        match clients.attestation.get(&id).await {
            Ok(model) => UpdateResourceResponse {
                new_state: flatten_provider(&id, &model, &request.planned_state),
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {} after update", id),
                    e.to_string(),
                ));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
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
            .and_then(|raw| AttestationProviderId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        match clients.attestation.delete(&id).await {
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

        if let Err(e) = AttestationProviderId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn expand_creation_params(config: &DynamicValue) -> ServiceCreationParams {
    let policy_signing_certificates = config
        .try_get_string(&AttributePath::new("policy_signing_certificate_data"))
        .map(|pem| JsonWebKeySet {
            keys: vec![JsonWebKey {
                kty: "RSA".to_string(),
                x5c: vec![strip_pem_armor(&pem)],
            }],
        });

    ServiceCreationParams {
        location: common::normalize_location(
            &config
                .try_get_string(&AttributePath::new("location"))
                .unwrap_or_default(),
        ),
        tags: tags::expand(config),
        properties: ServiceCreationSpecificParams {
            policy_signing_certificates,
        },
    }
}

/// The JWK x5c member wants the bare base64 DER, not the PEM envelope.
fn strip_pem_armor(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.starts_with("-----"))
        .collect::<Vec<_>>()
        .join("")
}

fn flatten_provider(
    id: &AttestationProviderId,
    model: &super::client::AttestationProvider,
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

    // Not returned by the API; preserved from configuration.
    if let Some(cert) = config.try_get_string(&AttributePath::new("policy_signing_certificate_data"))
    {
        let _ = state.set_string(
            &AttributePath::new("policy_signing_certificate_data"),
            cert,
        );
    }

    let props = model.properties.clone().unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("attestation_uri"),
        props.attest_uri.unwrap_or_default(),
    );
    let _ = state.set_string(
        &AttributePath::new("trust_model"),
        props.trust_model.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const PROVIDER_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Attestation/attestationProviders/attestor1";

    #[test]
    fn pem_armor_is_stripped() {
        let pem = "-----BEGIN CERTIFICATE-----\nMIIBfTCCASeg\nAwIBAgIQ\n-----END CERTIFICATE-----";
        assert_eq!(strip_pem_armor(pem), "MIIBfTCCASegAwIBAgIQ");
    }

    #[tokio::test]
    async fn create_flattens_computed_status_from_put_response() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", PROVIDER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", PROVIDER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "uksouth",
                    "properties": {
                        "trustModel": "SGX",
                        "status": "Ready",
                        "attestUri": "https://attestor1.uks.attest.azure.net"
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = AttestationProviderResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "attestor1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "UK South".to_string());

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
                .get_string(&AttributePath::new("attestation_uri"))
                .unwrap(),
            "https://attestor1.uks.attest.azure.net"
        );
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("trust_model"))
                .unwrap(),
            "SGX"
        );
        put.assert_async().await;
    }

    #[tokio::test]
    async fn update_patches_tags_only() {
        let mut server = mockito::Server::new_async().await;
        let patch = server
            .mock("PATCH", PROVIDER_PATH)
            .match_query(mockito::Matcher::Any)
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"tags":{"env":"prod"}}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"location":"uksouth","tags":{"env":"prod"}}"#)
            .create_async()
            .await;
        let _read = server
            .mock("GET", PROVIDER_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"location":"uksouth","tags":{"env":"prod"},"properties":{"trustModel":"AAD","attestUri":"https://a.example"}}"#)
            .create_async()
            .await;

        let mut resource = AttestationProviderResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut prior = DynamicValue::empty_object();
        let _ = prior.set_string(&AttributePath::new("id"), PROVIDER_PATH.to_string());

        let mut planned = prior.clone();
        let _ = planned.set_map(
            &AttributePath::new("tags"),
            std::collections::HashMap::from([(
                "env".to_string(),
                tfkit::types::Dynamic::String("prod".to_string()),
            )]),
        );

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: RESOURCE_TYPE.to_string(),
                    prior_state: prior,
                    planned_state: planned.clone(),
                    config: planned,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        patch.assert_async().await;
    }
}
