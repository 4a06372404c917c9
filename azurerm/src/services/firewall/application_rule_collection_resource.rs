//! azurerm_firewall_application_rule_collection
//!
//! Rule collections are not standalone ARM objects: they live inside the
//! parent firewall's `applicationRuleCollections` list. Every operation
//! here is a locked read-modify-write of the parent.

use super::client::{
    ApplicationRule, ApplicationRuleCollectionProperties, ApplicationRuleProtocol, AzureFirewall,
    AzureFirewallApplicationRuleCollection, RuleCollectionAction,
};
use super::firewall_resource::wait_for_firewall;
use super::parse::{FirewallApplicationRuleCollectionId, FirewallId};
use super::validate;
use super::FIREWALL_RESOURCE_NAME;
use crate::clients;
use crate::common;
use crate::locks;
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
use tfkit::validator::OneOfValidator;

const RESOURCE_TYPE: &str = "azurerm_firewall_application_rule_collection";

#[derive(Default)]
pub struct FirewallApplicationRuleCollectionResource {
    clients: Option<clients::Client>,
}

impl FirewallApplicationRuleCollectionResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn protocol_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("port".to_string(), AttributeType::Number),
        ("type".to_string(), AttributeType::String),
    ]))
}

fn rule_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("name".to_string(), AttributeType::String),
        ("description".to_string(), AttributeType::String),
        (
            "source_addresses".to_string(),
            AttributeType::List(Box::new(AttributeType::String)),
        ),
        (
            "target_fqdns".to_string(),
            AttributeType::List(Box::new(AttributeType::String)),
        ),
        (
            "fqdn_tags".to_string(),
            AttributeType::List(Box::new(AttributeType::String)),
        ),
        (
            "protocol".to_string(),
            AttributeType::List(Box::new(protocol_type())),
        ),
    ]))
}

#[async_trait]
impl Resource for FirewallApplicationRuleCollectionResource {
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
            .description("Manages an Application Rule Collection on an Azure Firewall")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the rule collection")
                    .required()
                    .force_new()
                    .validator(validate::firewall_name())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("azure_firewall_name", AttributeType::String)
                    .description("The firewall the collection belongs to")
                    .required()
                    .force_new()
                    .validator(validate::firewall_name())
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Number)
                    .description("Priority of the collection, 100 to 65000")
                    .required()
                    .validator(validate::rule_collection_priority())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("action", AttributeType::String)
                    .description("Whether matching traffic is allowed or denied")
                    .required()
                    .validator(OneOfValidator::new(&["Allow", "Deny"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("rule", AttributeType::List(Box::new(rule_type())))
                    .description("The rules in this collection")
                    .required()
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
        let (name, firewall_name, resource_group) = match (
            config.get_string(&AttributePath::new("name")),
            config.get_string(&AttributePath::new("azure_firewall_name")),
            config.get_string(&AttributePath::new("resource_group_name")),
        ) {
            (Ok(name), Ok(fw), Ok(rg)) => (name, fw, rg),
            _ => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error(
                        "Missing required argument",
                        "`name`, `azure_firewall_name` and `resource_group_name` are required",
                    )],
                }
            }
        };

        let firewall_id = FirewallId::new(&clients.subscription_id, &resource_group, &firewall_name);
        let id = FirewallApplicationRuleCollectionId::new(
            &clients.subscription_id,
            &resource_group,
            &firewall_name,
            &name,
        );

        let _guard = locks::by_name(&firewall_name, FIREWALL_RESOURCE_NAME).await;

        let mut firewall = match clients.firewall.get(&firewall_id).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", firewall_id),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let mut properties = firewall.properties.take().unwrap_or_default();
        let mut collections = properties.application_rule_collections.unwrap_or_default();

        if collections.iter().any(|c| c.name == name) {
            diagnostics.push(common::import_as_exists_error(RESOURCE_TYPE, &id));
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        }

        collections.push(expand_rule_collection(&name, config));
        properties.application_rule_collections = Some(collections);
        firewall.properties = Some(properties);

        let written = match clients.firewall.create_or_update(&firewall_id, &firewall).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let firewall = match wait_for_firewall(clients, &firewall_id, written, &ctx).await {
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

        match find_collection(&firewall, &name) {
            Some(collection) => CreateResourceResponse {
                new_state: flatten_rule_collection(&id, collection),
                diagnostics,
            },
            None => {
                diagnostics.push(Diagnostic::error(
                    format!("creating {}", id),
                    "the rule collection was not present after the update".to_string(),
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

        let id = match FirewallApplicationRuleCollectionId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        let firewall = match clients.firewall.get(&id.firewall_id()).await {
            Ok(model) => model,
            Err(e) if e.was_not_found() => {
                tracing::info!(firewall = %id.firewall_id(), "parent firewall was not found - removing from state");
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", id.firewall_id()),
                    e.to_string(),
                ));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        match find_collection(&firewall, &id.name) {
            Some(collection) => ReadResourceResponse {
                new_state: Some(flatten_rule_collection(&id, collection)),
                diagnostics,
            },
            None => {
                tracing::info!(%id, "rule collection was not found - removing from state");
                ReadResourceResponse {
                    new_state: None,
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
            .and_then(|raw| {
                FirewallApplicationRuleCollectionId::parse(&raw).map_err(|e| e.to_string())
            }) {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let firewall_id = id.firewall_id();
        let _guard = locks::by_name(&id.firewall_name, FIREWALL_RESOURCE_NAME).await;

        let mut firewall = match clients.firewall.get(&firewall_id).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", firewall_id),
                    e.to_string(),
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let mut properties = firewall.properties.take().unwrap_or_default();
        let mut collections = properties.application_rule_collections.unwrap_or_default();

        let Some(slot) = collections.iter_mut().find(|c| c.name == id.name) else {
            diagnostics.push(Diagnostic::error(
                format!("updating {}", id),
                "the rule collection no longer exists on the firewall".to_string(),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };
        *slot = expand_rule_collection(&id.name, &request.planned_state);

        properties.application_rule_collections = Some(collections);
        firewall.properties = Some(properties);

        let written = match clients.firewall.create_or_update(&firewall_id, &firewall).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let firewall = match wait_for_firewall(clients, &firewall_id, written, &ctx).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("waiting for update of {}", id), e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        match find_collection(&firewall, &id.name) {
            Some(collection) => UpdateResourceResponse {
                new_state: flatten_rule_collection(&id, collection),
                diagnostics,
            },
            None => {
                diagnostics.push(Diagnostic::error(
                    format!("updating {}", id),
                    "the rule collection was not present after the update".to_string(),
                ));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
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
            .and_then(|raw| {
                FirewallApplicationRuleCollectionId::parse(&raw).map_err(|e| e.to_string())
            }) {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let firewall_id = id.firewall_id();
        let _guard = locks::by_name(&id.firewall_name, FIREWALL_RESOURCE_NAME).await;

        let mut firewall = match clients.firewall.get(&firewall_id).await {
            Ok(model) => model,
            Err(e) if e.was_not_found() => {
                // Parent gone means the collection is gone too.
                return DeleteResourceResponse { diagnostics };
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("retrieving {}", firewall_id),
                    e.to_string(),
                ));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let mut properties = firewall.properties.take().unwrap_or_default();
        let mut collections = properties.application_rule_collections.unwrap_or_default();
        let before = collections.len();
        collections.retain(|c| c.name != id.name);

        if collections.len() == before {
            // Already absent.
            return DeleteResourceResponse { diagnostics };
        }

        properties.application_rule_collections = Some(collections);
        firewall.properties = Some(properties);

        let written = match clients.firewall.create_or_update(&firewall_id, &firewall).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("deleting {}", id), e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        if let Err(e) = wait_for_firewall(clients, &firewall_id, written, &ctx).await {
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

        if let Err(e) = FirewallApplicationRuleCollectionId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn find_collection<'a>(
    firewall: &'a AzureFirewall,
    name: &str,
) -> Option<&'a AzureFirewallApplicationRuleCollection> {
    firewall
        .properties
        .as_ref()
        .and_then(|p| p.application_rule_collections.as_ref())
        .and_then(|collections| collections.iter().find(|c| c.name == name))
}

fn expand_rule_collection(
    name: &str,
    config: &DynamicValue,
) -> AzureFirewallApplicationRuleCollection {
    let rules = config
        .try_get_list(&AttributePath::new("rule"))
        .map(|rules| rules.iter().filter_map(expand_rule).collect())
        .unwrap_or_default();

    AzureFirewallApplicationRuleCollection {
        name: name.to_string(),
        properties: Some(ApplicationRuleCollectionProperties {
            priority: config
                .try_get_number(&AttributePath::new("priority"))
                .unwrap_or_default() as i64,
            action: config
                .try_get_string(&AttributePath::new("action"))
                .map(|action_type| RuleCollectionAction { action_type }),
            rules,
        }),
    }
}

fn expand_rule(rule: &Dynamic) -> Option<ApplicationRule> {
    let Dynamic::Map(fields) = rule else {
        return None;
    };

    let get_string = |key: &str| match fields.get(key) {
        Some(Dynamic::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };
    let get_strings = |key: &str| match fields.get(key) {
        Some(Dynamic::List(items)) => common::expand_string_list(items),
        _ => Vec::new(),
    };

    let protocols = match fields.get("protocol") {
        Some(Dynamic::List(items)) => items
            .iter()
            .filter_map(|item| {
                let Dynamic::Map(protocol) = item else {
                    return None;
                };
                let protocol_type = match protocol.get("type") {
                    Some(Dynamic::String(s)) => s.clone(),
                    _ => return None,
                };
                let port = match protocol.get("port") {
                    Some(Dynamic::Number(n)) => *n as i64,
                    _ => return None,
                };
                Some(ApplicationRuleProtocol {
                    protocol_type,
                    port,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    Some(ApplicationRule {
        name: get_string("name").unwrap_or_default(),
        description: get_string("description"),
        source_addresses: get_strings("source_addresses"),
        protocols,
        target_fqdns: get_strings("target_fqdns"),
        fqdn_tags: get_strings("fqdn_tags"),
    })
}

fn flatten_rule_collection(
    id: &FirewallApplicationRuleCollectionId,
    collection: &AzureFirewallApplicationRuleCollection,
) -> DynamicValue {
    let mut state = DynamicValue::empty_object();
    let _ = state.set_string(&AttributePath::new("id"), id.to_string());
    let _ = state.set_string(&AttributePath::new("name"), id.name.clone());
    let _ = state.set_string(
        &AttributePath::new("azure_firewall_name"),
        id.firewall_name.clone(),
    );
    let _ = state.set_string(
        &AttributePath::new("resource_group_name"),
        id.resource_group.clone(),
    );

    let props = collection.properties.clone().unwrap_or_default();
    let _ = state.set_number(&AttributePath::new("priority"), props.priority as f64);
    let _ = state.set_string(
        &AttributePath::new("action"),
        props.action.map(|a| a.action_type).unwrap_or_default(),
    );

    let rules = props
        .rules
        .iter()
        .map(|rule| {
            Dynamic::Map(HashMap::from([
                ("name".to_string(), Dynamic::String(rule.name.clone())),
                (
                    "description".to_string(),
                    Dynamic::String(rule.description.clone().unwrap_or_default()),
                ),
                (
                    "source_addresses".to_string(),
                    Dynamic::List(common::string_list(&rule.source_addresses)),
                ),
                (
                    "target_fqdns".to_string(),
                    Dynamic::List(common::string_list(&rule.target_fqdns)),
                ),
                (
                    "fqdn_tags".to_string(),
                    Dynamic::List(common::string_list(&rule.fqdn_tags)),
                ),
                (
                    "protocol".to_string(),
                    Dynamic::List(
                        rule.protocols
                            .iter()
                            .map(|p| {
                                Dynamic::Map(HashMap::from([
                                    (
                                        "type".to_string(),
                                        Dynamic::String(p.protocol_type.clone()),
                                    ),
                                    ("port".to_string(), Dynamic::Number(p.port as f64)),
                                ]))
                            })
                            .collect(),
                    ),
                ),
            ]))
        })
        .collect();
    let _ = state.set_list(&AttributePath::new("rule"), rules);

    state
}
