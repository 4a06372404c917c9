//! azurerm_active_directory_domain_service_replica_set
//!
//! Replica sets live inside the parent domain service's `replicaSets`
//! list; create and delete are locked read-modify-writes of the parent,
//! serialized against sibling replica sets through the named lock.

use super::client::ReplicaSet;
use super::domain_service_resource::{flatten_replica_set, wait_for_domain_controllers};
use super::parse::{DomainServiceId, DomainServiceReplicaSetId};
use super::DOMAIN_SERVICE_RESOURCE_NAME;
use crate::clients;
use crate::common;
use crate::locks;
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

const RESOURCE_TYPE: &str = "azurerm_active_directory_domain_service_replica_set";

#[derive(Default)]
pub struct DomainServiceReplicaSetResource {
    clients: Option<clients::Client>,
}

impl DomainServiceReplicaSetResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for DomainServiceReplicaSetResource {
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
            .description("Manages an additional replica set of an Active Directory Domain Service")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("domain_service_id", AttributeType::String)
                    .description("The domain service to add the replica set to")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .description("The Azure region of the replica set")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("subnet_id", AttributeType::String)
                    .description("The subnet the replica set's domain controllers live in")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "domain_controller_ip_addresses",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("service_status", AttributeType::String)
                    .computed()
                    .build(),
            )
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
        let (raw_domain_service_id, location, subnet_id) = match (
            config.get_string(&AttributePath::new("domain_service_id")),
            config.get_string(&AttributePath::new("location")),
            config.get_string(&AttributePath::new("subnet_id")),
        ) {
            (Ok(ds), Ok(location), Ok(subnet)) => (ds, location, subnet),
            _ => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "Missing required argument",
                        "`domain_service_id`, `location` and `subnet_id` are required",
                    )],
                }
            }
        };

        let domain_service_id = match DomainServiceId::parse(&raw_domain_service_id) {
            Ok(id) => id,
            Err(e) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error("Invalid domain_service_id", e.to_string())],
                }
            }
        };

        let _guard =
            locks::by_name(&domain_service_id.name, DOMAIN_SERVICE_RESOURCE_NAME).await;

        let mut service = match clients.domainservices.get(&domain_service_id).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", domain_service_id),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let mut properties = service.properties.take().unwrap_or_default();
        let mut replica_sets = properties.replica_sets.unwrap_or_default();

        if replica_sets
            .iter()
            .any(|set| set.subnet_id.as_deref() == Some(subnet_id.as_str()))
        {
            diagnostics.push(Diagnostic::error(
                "Replica set already exists",
                format!(
                    "{} already has a replica set in subnet {:?} - import it instead",
                    domain_service_id, subnet_id
                ),
            ));
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        replica_sets.push(ReplicaSet {
            replica_set_id: None,
            location: Some(common::normalize_location(&location)),
            subnet_id: Some(subnet_id.clone()),
            domain_controller_ip_addresses: None,
            service_status: None,
        });
        properties.replica_sets = Some(replica_sets);
        service.properties = Some(properties);

        let written = match clients
            .domainservices
            .create_or_update(&domain_service_id, &service)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("adding replica set to {}", domain_service_id),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let service =
            match wait_for_domain_controllers(clients, &domain_service_id, written, &ctx).await {
                Ok(model) => model,
                Err(e) => {
                    diagnostics.push(Diagnostic::error(
                        format!("waiting for replica set of {}", domain_service_id),
                        e,
                    ));
                    return CreateResourceResponse {
                        new_state: request.planned_state,
                        diagnostics,
                    };
                }
            };

        let created = service
            .properties
            .as_ref()
            .and_then(|p| p.replica_sets.as_ref())
            .and_then(|sets| {
                sets.iter()
                    .find(|set| set.subnet_id.as_deref() == Some(subnet_id.as_str()))
            });

        match created {
            Some(set) => {
                let id = DomainServiceReplicaSetId::new(
                    &domain_service_id.subscription_id,
                    &domain_service_id.resource_group,
                    &domain_service_id.name,
                    set.replica_set_id.clone().unwrap_or_default(),
                );
                CreateResourceResponse {
                    new_state: flatten_state(&id, &domain_service_id, set),
                    diagnostics,
                }
            }
            None => {
                diagnostics.push(Diagnostic::error(
                    format!("creating replica set on {}", domain_service_id),
                    "the replica set was not present after the update".to_string(),
                ));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
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

        let id = match DomainServiceReplicaSetId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        let domain_service_id = id.domain_service_id();
        let service = match clients.domainservices.get(&domain_service_id).await {
            Ok(model) => model,
            Err(e) if e.was_not_found() => {
                tracing::info!(%domain_service_id, "parent domain service was not found - removing from state");
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", domain_service_id),
                    e.to_string(),
                ));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let found = service
            .properties
            .as_ref()
            .and_then(|p| p.replica_sets.as_ref())
            .and_then(|sets| {
                sets.iter()
                    .find(|set| set.replica_set_id.as_deref() == Some(id.replica_set_id.as_str()))
            });

        match found {
            Some(set) => ReadResourceResponse {
                new_state: Some(flatten_state(&id, &domain_service_id, set)),
                diagnostics,
            },
            None => {
                tracing::info!(%id, "replica set was not found - removing from state");
                ReadResourceResponse {
                    new_state: None,
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
        // Every argument is force-new; updates never reach the API.
        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
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
            .and_then(|raw| DomainServiceReplicaSetId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let domain_service_id = id.domain_service_id();
        let _guard =
            locks::by_name(&domain_service_id.name, DOMAIN_SERVICE_RESOURCE_NAME).await;

        let mut service = match clients.domainservices.get(&domain_service_id).await {
            Ok(model) => model,
            Err(e) if e.was_not_found() => {
                return DeleteResourceResponse { diagnostics };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", domain_service_id),
                    e.to_string(),
                ));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let mut properties = service.properties.take().unwrap_or_default();
        let mut replica_sets = properties.replica_sets.unwrap_or_default();
        let before = replica_sets.len();
        replica_sets
            .retain(|set| set.replica_set_id.as_deref() != Some(id.replica_set_id.as_str()));

        if replica_sets.len() == before {
            return DeleteResourceResponse { diagnostics };
        }

        properties.replica_sets = Some(replica_sets);
        service.properties = Some(properties);

        let written = match clients
            .domainservices
            .create_or_update(&domain_service_id, &service)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("deleting {}", id), e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        if let Err(e) = wait_for_domain_controllers(clients, &domain_service_id, written, &ctx).await
        {
            diagnostics.push(Diagnostic::error(
                format!("waiting for deletion of {}", id),
                e,
            ));
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

        if let Err(e) = DomainServiceReplicaSetId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn flatten_state(
    id: &DomainServiceReplicaSetId,
    domain_service_id: &DomainServiceId,
    set: &ReplicaSet,
) -> DynamicValue {
    let mut state = DynamicValue::empty_object();
    let _ = state.set_string(&AttributePath::new("id"), id.to_string());
    let _ = state.set_string(
        &AttributePath::new("domain_service_id"),
        domain_service_id.to_string(),
    );

    // Reuse the parent's per-set flattening for the shared fields.
    if let Dynamic::Map(fields) = flatten_replica_set(domain_service_id, set) {
        for key in [
            "subnet_id",
            "location",
            "domain_controller_ip_addresses",
            "service_status",
        ] {
            if let Some(value) = fields.get(key) {
                let _ = state.set_value(&AttributePath::new(key), value.clone());
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const SERVICE_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.AAD/domainServices/aadds";
    const NEW_SUBNET: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-2/subnets/aadds-replica";

    fn parent_body(with_second_set: bool) -> String {
        let second = if with_second_set {
            r#",{
                "replicaSetId": "rs-2",
                "location": "northeurope",
                "subnetId": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-2/subnets/aadds-replica",
                "domainControllerIpAddresses": ["10.1.0.4", "10.1.0.5"],
                "serviceStatus": "Running"
            }"#
        } else {
            ""
        };

        format!(
            r#"{{
                "location": "westeurope",
                "properties": {{
                    "provisioningState": "Succeeded",
                    "domainName": "aadds.example.com",
                    "replicaSets": [{{
                        "replicaSetId": "rs-1",
                        "location": "westeurope",
                        "subnetId": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/aadds-subnet",
                        "domainControllerIpAddresses": ["10.0.1.4", "10.0.1.5"],
                        "serviceStatus": "Running"
                    }}{}]
                }}
            }}"#,
            second
        )
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(
            &AttributePath::new("domain_service_id"),
            SERVICE_PATH.to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "North Europe".to_string());
        let _ = config.set_string(&AttributePath::new("subnet_id"), NEW_SUBNET.to_string());
        config
    }

    #[tokio::test]
    async fn create_appends_replica_set_and_waits_for_controllers() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(parent_body(false))
            .create_async()
            .await;
        let put = server
            .mock("PUT", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(parent_body(true))
            .create_async()
            .await;

        let mut resource = DomainServiceReplicaSetResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

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
        assert!(response
            .new_state
            .get_string(&AttributePath::new("id"))
            .unwrap()
            .ends_with("/replicaSets/rs-2"));
        assert_eq!(
            response
                .new_state
                .get_list(&AttributePath::new("domain_controller_ip_addresses"))
                .unwrap()
                .len(),
            2
        );
        put.assert_async().await;
    }

    #[tokio::test]
    async fn create_rejects_duplicate_subnet() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(parent_body(true))
            .create_async()
            .await;

        let mut resource = DomainServiceReplicaSetResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

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
        assert!(response.diagnostics[0]
            .summary
            .contains("Replica set already exists"));
    }

    #[tokio::test]
    async fn read_finds_replica_set_by_id() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(parent_body(true))
            .create_async()
            .await;

        let mut resource = DomainServiceReplicaSetResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(
            &AttributePath::new("id"),
            format!("{}/replicaSets/rs-2", SERVICE_PATH),
        );

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

        let new_state = response.new_state.unwrap();
        assert_eq!(
            new_state
                .get_string(&AttributePath::new("service_status"))
                .unwrap(),
            "Running"
        );
        assert_eq!(
            new_state
                .get_string(&AttributePath::new("location"))
                .unwrap(),
            "northeurope"
        );
    }

    #[tokio::test]
    async fn read_removes_state_when_replica_set_is_gone() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(parent_body(false))
            .create_async()
            .await;

        let mut resource = DomainServiceReplicaSetResource::new();
        configure_resource(&mut resource, test_clients(&server.url())).await;

        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(
            &AttributePath::new("id"),
            format!("{}/replicaSets/rs-2", SERVICE_PATH),
        );

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
