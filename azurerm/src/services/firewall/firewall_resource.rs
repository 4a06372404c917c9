//! azurerm_firewall

use super::client::{
    AzureFirewall, AzureFirewallIpConfiguration, AzureFirewallIpConfigurationProperties,
    AzureFirewallProperties, AzureFirewallSku, SubResource,
};
use super::parse::FirewallId;
use super::validate;
use super::FIREWALL_RESOURCE_NAME;
use crate::clients;
use crate::common;
use crate::locks;
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
    UpdateResourceRequest, UpdateResourceResponse, ValidateResourceConfigRequest,
    ValidateResourceConfigResponse,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfkit::validator::OneOfValidator;

const RESOURCE_TYPE: &str = "azurerm_firewall";
const VIRTUAL_NETWORK_RESOURCE_NAME: &str = "virtualNetworks";

const DNS_PROXY_KEY: &str = "Network.DNS.EnableProxy";
const DNS_SERVERS_KEY: &str = "Network.DNS.Servers";

#[derive(Default)]
pub struct FirewallResource {
    clients: Option<clients::Client>,
}

impl FirewallResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ip_configuration_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("name".to_string(), AttributeType::String),
        ("subnet_id".to_string(), AttributeType::String),
        ("public_ip_address_id".to_string(), AttributeType::String),
        ("private_ip_address".to_string(), AttributeType::String),
    ]))
}

#[async_trait]
impl Resource for FirewallResource {
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
            .description("Manages an Azure Firewall")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the Firewall")
                    .required()
                    .force_new()
                    .validator(validate::firewall_name())
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("sku_name", AttributeType::String)
                    .description("SKU name of the Firewall")
                    .optional()
                    .force_new()
                    .default_value(Dynamic::String("AZFW_VNet".to_string()))
                    .validator(OneOfValidator::new(&["AZFW_VNet", "AZFW_Hub"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sku_tier", AttributeType::String)
                    .description("SKU tier of the Firewall")
                    .optional()
                    .default_value(Dynamic::String("Standard".to_string()))
                    .validator(OneOfValidator::new(&["Basic", "Standard", "Premium"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("threat_intel_mode", AttributeType::String)
                    .description("Operation mode for threat intelligence based filtering")
                    .optional()
                    .default_value(Dynamic::String("Alert".to_string()))
                    .validator(OneOfValidator::new(&["Alert", "Deny", "Off"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("zones", AttributeType::Set(Box::new(AttributeType::String)))
                    .description("Availability zones the Firewall spans")
                    .optional()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "dns_servers",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("DNS servers used when DNS proxying is enabled")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "ip_configuration",
                    AttributeType::List(Box::new(ip_configuration_type())),
                )
                .description("IP configurations attaching the Firewall to a subnet and public IP")
                .required()
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

        if let Some(configs) = request
            .config
            .try_get_list(&AttributePath::new("ip_configuration"))
        {
            for (idx, block) in configs.iter().enumerate() {
                let Dynamic::Map(fields) = block else { continue };

                if !matches!(fields.get("name"), Some(Dynamic::String(s)) if !s.is_empty()) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            "every ip_configuration needs a `name`",
                        )
                        .with_attribute(
                            AttributePath::new("ip_configuration").index(idx as i64),
                        ),
                    );
                }
                if !matches!(fields.get("public_ip_address_id"), Some(Dynamic::String(s)) if !s.is_empty())
                {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            "every ip_configuration needs a `public_ip_address_id`",
                        )
                        .with_attribute(
                            AttributePath::new("ip_configuration").index(idx as i64),
                        ),
                    );
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

        let id = FirewallId::new(&clients.subscription_id, &resource_group, &name);

        // The firewall itself and the virtual networks it attaches to are
        // shared with sibling resources (rule collections, subnets).
        let _firewall_guard = locks::by_name(&name, FIREWALL_RESOURCE_NAME).await;
        let mut vnet_guards = Vec::new();
        for vnet in virtual_network_names(&request.planned_state) {
            vnet_guards.push(locks::by_name(&vnet, VIRTUAL_NETWORK_RESOURCE_NAME).await);
        }

        match clients.firewall.get(&id).await {
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

        let params = expand_firewall(&request.planned_state);
        let written = match clients.firewall.create_or_update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_firewall(clients, &id, written, &ctx).await {
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
            new_state: flatten_firewall(&id, &model),
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

        let id = match FirewallId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.firewall.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_firewall(&id, &model)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "firewall was not found - removing from state");
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
            .and_then(|raw| FirewallId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let _firewall_guard = locks::by_name(&id.name, FIREWALL_RESOURCE_NAME).await;
        let mut vnet_guards = Vec::new();
        for vnet in virtual_network_names(&request.planned_state) {
            vnet_guards.push(locks::by_name(&vnet, VIRTUAL_NETWORK_RESOURCE_NAME).await);
        }

        // A firewall is replaced wholesale; fetch first so rule collections
        // managed by sibling resources survive the write.
        let mut existing = match clients.firewall.get(&id).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("retrieving {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let desired = expand_firewall(&request.planned_state);
        existing.location = desired.location;
        existing.tags = desired.tags;
        existing.zones = desired.zones;
        let rule_collections = existing
            .properties
            .as_ref()
            .and_then(|p| p.application_rule_collections.clone());
        let mut properties = desired.properties.unwrap_or_default();
        properties.application_rule_collections = rule_collections;
        existing.properties = Some(properties);

        let written = match clients.firewall.create_or_update(&id, &existing).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_firewall(clients, &id, written, &ctx).await {
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
            new_state: flatten_firewall(&id, &model),
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
            .and_then(|raw| FirewallId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let _firewall_guard = locks::by_name(&id.name, FIREWALL_RESOURCE_NAME).await;
        let mut vnet_guards = Vec::new();
        for vnet in virtual_network_names(&request.prior_state) {
            vnet_guards.push(locks::by_name(&vnet, VIRTUAL_NETWORK_RESOURCE_NAME).await);
        }

        match clients.firewall.delete(&id).await {
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

        if let Err(e) = FirewallId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

pub(super) async fn wait_for_firewall(
    clients: &clients::Client,
    id: &FirewallId,
    written: Option<AzureFirewall>,
    ctx: &Context,
) -> Result<AzureFirewall, String> {
    match written {
        Some(model) if provisioning_state(&model) == "Succeeded" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<AzureFirewall> = {
        let client = clients.firewall.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let firewall = client.get(&id).await?;
                let state = provisioning_state(&firewall);
                Ok((firewall, state))
            })
        })
    };

    StateChangeConf {
        pending: vec!["Updating".to_string(), "Provisioning".to_string()],
        target: vec!["Succeeded".to_string()],
        refresh,
        delay: Duration::from_secs(10),
        poll_interval: Duration::from_secs(15),
        timeout: Duration::from_secs(90 * 60),
        not_found_checks: 3,
    }
    .wait_for_state(ctx)
    .await
    .map_err(|e| e.to_string())
}

fn provisioning_state(model: &AzureFirewall) -> String {
    model
        .properties
        .as_ref()
        .and_then(|p| p.provisioning_state.clone())
        .unwrap_or_default()
}

/// Virtual network names referenced by the subnet IDs in ip_configuration,
/// deduplicated so each lock is taken once.
fn virtual_network_names(config: &DynamicValue) -> Vec<String> {
    let mut names = Vec::new();
    let Some(configs) = config.try_get_list(&AttributePath::new("ip_configuration")) else {
        return names;
    };

    for block in configs {
        let Dynamic::Map(fields) = block else { continue };
        let Some(Dynamic::String(subnet_id)) = fields.get("subnet_id") else {
            continue;
        };

        let segments: Vec<&str> = subnet_id.split('/').collect();
        if let Some(pos) = segments
            .iter()
            .position(|s| s.eq_ignore_ascii_case("virtualNetworks"))
        {
            if let Some(name) = segments.get(pos + 1) {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
    }

    names.sort();
    names
}

fn expand_firewall(config: &DynamicValue) -> AzureFirewall {
    let ip_configurations = config
        .try_get_list(&AttributePath::new("ip_configuration"))
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| {
                    let Dynamic::Map(fields) = block else { return None };
                    let get = |key: &str| match fields.get(key) {
                        Some(Dynamic::String(s)) if !s.is_empty() => Some(s.clone()),
                        _ => None,
                    };
                    Some(AzureFirewallIpConfiguration {
                        name: get("name").unwrap_or_default(),
                        properties: Some(AzureFirewallIpConfigurationProperties {
                            subnet: get("subnet_id").map(|id| SubResource { id }),
                            public_ip_address: get("public_ip_address_id")
                                .map(|id| SubResource { id }),
                            private_ip_address: None,
                        }),
                    })
                })
                .collect::<Vec<_>>()
        });

    let dns_servers = config
        .try_get_list(&AttributePath::new("dns_servers"))
        .map(|items| common::expand_string_list(&items))
        .unwrap_or_default();
    let additional_properties = if dns_servers.is_empty() {
        None
    } else {
        Some(HashMap::from([
            (DNS_PROXY_KEY.to_string(), "true".to_string()),
            (DNS_SERVERS_KEY.to_string(), dns_servers.join(",")),
        ]))
    };

    AzureFirewall {
        location: config
            .try_get_string(&AttributePath::new("location"))
            .map(|l| common::normalize_location(&l)),
        tags: tags::expand(config),
        zones: config
            .try_get_list(&AttributePath::new("zones"))
            .map(|zones| common::expand_string_list(&zones)),
        properties: Some(AzureFirewallProperties {
            sku: Some(AzureFirewallSku {
                name: config.try_get_string(&AttributePath::new("sku_name")),
                tier: config.try_get_string(&AttributePath::new("sku_tier")),
            }),
            threat_intel_mode: config.try_get_string(&AttributePath::new("threat_intel_mode")),
            ip_configurations,
            additional_properties,
            application_rule_collections: None,
            provisioning_state: None,
        }),
    }
}

fn flatten_firewall(id: &FirewallId, model: &AzureFirewall) -> DynamicValue {
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
    let _ = state.set_list(
        &AttributePath::new("zones"),
        common::string_list(model.zones.as_deref().unwrap_or_default()),
    );

    let props = model.properties.clone().unwrap_or_default();
    let sku = props.sku.unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("sku_name"),
        sku.name.unwrap_or_else(|| "AZFW_VNet".to_string()),
    );
    let _ = state.set_string(
        &AttributePath::new("sku_tier"),
        sku.tier.unwrap_or_else(|| "Standard".to_string()),
    );
    let _ = state.set_string(
        &AttributePath::new("threat_intel_mode"),
        props.threat_intel_mode.unwrap_or_else(|| "Alert".to_string()),
    );

    let dns_servers = props
        .additional_properties
        .as_ref()
        .and_then(|p| p.get(DNS_SERVERS_KEY))
        .map(|joined| {
            joined
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let _ = state.set_list(
        &AttributePath::new("dns_servers"),
        common::string_list(&dns_servers),
    );

    let ip_configurations = props
        .ip_configurations
        .unwrap_or_default()
        .iter()
        .map(|ip_config| {
            let p = ip_config.properties.clone().unwrap_or_default();
            Dynamic::Map(HashMap::from([
                ("name".to_string(), Dynamic::String(ip_config.name.clone())),
                (
                    "subnet_id".to_string(),
                    Dynamic::String(p.subnet.map(|s| s.id).unwrap_or_default()),
                ),
                (
                    "public_ip_address_id".to_string(),
                    Dynamic::String(p.public_ip_address.map(|s| s.id).unwrap_or_default()),
                ),
                (
                    "private_ip_address".to_string(),
                    Dynamic::String(p.private_ip_address.unwrap_or_default()),
                ),
            ]))
        })
        .collect();
    let _ = state.set_list(&AttributePath::new("ip_configuration"), ip_configurations);

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const FIREWALL_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/azureFirewalls/fw-1";
    const SUBNET_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/AzureFirewallSubnet";
    const PIP_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/publicIPAddresses/pip-1";

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "fw-1".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_string(&AttributePath::new("sku_name"), "AZFW_VNet".to_string());
        let _ = config.set_string(&AttributePath::new("sku_tier"), "Standard".to_string());
        let _ = config.set_list(
            &AttributePath::new("ip_configuration"),
            vec![Dynamic::Map(HashMap::from([
                (
                    "name".to_string(),
                    Dynamic::String("configuration".to_string()),
                ),
                ("subnet_id".to_string(), Dynamic::String(SUBNET_ID.to_string())),
                (
                    "public_ip_address_id".to_string(),
                    Dynamic::String(PIP_ID.to_string()),
                ),
            ]))],
        );
        config
    }

    #[test]
    fn virtual_network_names_are_extracted_and_deduplicated() {
        let config = test_config();
        assert_eq!(virtual_network_names(&config), vec!["vnet-1"]);
    }

    #[test]
    fn expand_builds_dns_proxy_settings() {
        let mut config = test_config();
        let _ = config.set_list(
            &AttributePath::new("dns_servers"),
            vec![
                Dynamic::String("10.0.0.4".to_string()),
                Dynamic::String("10.0.0.5".to_string()),
            ],
        );

        let firewall = expand_firewall(&config);
        let additional = firewall
            .properties
            .unwrap()
            .additional_properties
            .unwrap();
        assert_eq!(additional.get(DNS_PROXY_KEY).map(String::as_str), Some("true"));
        assert_eq!(
            additional.get(DNS_SERVERS_KEY).map(String::as_str),
            Some("10.0.0.4,10.0.0.5")
        );
    }

    #[tokio::test]
    async fn validate_requires_public_ip_per_configuration() {
        let resource = FirewallResource::new();
        let mut config = test_config();
        let _ = config.set_list(
            &AttributePath::new("ip_configuration"),
            vec![Dynamic::Map(HashMap::from([(
                "name".to_string(),
                Dynamic::String("configuration".to_string()),
            )]))],
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
        assert!(response.diagnostics[0]
            .detail
            .contains("public_ip_address_id"));
    }

    #[tokio::test]
    async fn create_flattens_private_ip() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", FIREWALL_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", FIREWALL_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "properties": {
                        "provisioningState": "Succeeded",
                        "sku": {"name": "AZFW_VNet", "tier": "Standard"},
                        "threatIntelMode": "Alert",
                        "ipConfigurations": [{
                            "name": "configuration",
                            "properties": {
                                "privateIPAddress": "10.0.1.4",
                                "subnet": {"id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/AzureFirewallSubnet"},
                                "publicIPAddress": {"id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/publicIPAddresses/pip-1"}
                            }
                        }]
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = FirewallResource::new();
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
        let ip_configs = response
            .new_state
            .get_list(&AttributePath::new("ip_configuration"))
            .unwrap();
        assert_eq!(ip_configs.len(), 1);
        let Dynamic::Map(fields) = &ip_configs[0] else {
            panic!("expected ip_configuration object");
        };
        assert_eq!(
            fields.get("private_ip_address"),
            Some(&Dynamic::String("10.0.1.4".to_string()))
        );
    }
}
