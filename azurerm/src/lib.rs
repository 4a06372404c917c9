//! Terraform provider for Azure Resource Manager.

pub mod api;
pub mod clients;
pub mod common;
pub mod locks;
pub mod poll;
pub mod resourceid;
pub mod services;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_support;

use crate::api::{ArmClient, TokenSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfkit::context::Context;
use tfkit::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Diagnostic, DynamicValue};
use tfkit::validator::OneOfValidator;

/// Known cloud environments: resource manager endpoint and AAD authority.
fn environment_endpoints(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "public" => Some((
            "https://management.azure.com",
            "https://login.microsoftonline.com",
        )),
        "usgovernment" => Some((
            "https://management.usgovernmentcloudapi.us",
            "https://login.microsoftonline.us",
        )),
        "china" => Some((
            "https://management.chinacloudapi.cn",
            "https://login.chinacloudapi.cn",
        )),
        _ => None,
    }
}

#[derive(Default)]
pub struct AzureRmProvider;

impl AzureRmProvider {
    pub fn new() -> Self {
        Self
    }
}

fn config_or_env(config: &DynamicValue, attribute: &str, env_var: &str) -> Option<String> {
    config
        .try_get_string(&AttributePath::new(attribute))
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|s| !s.is_empty()))
}

#[async_trait]
impl Provider for AzureRmProvider {
    fn type_name(&self) -> &str {
        "azurerm"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("The Azure Resource Manager provider")
            .attribute(
                AttributeBuilder::new("subscription_id", AttributeType::String)
                    .description("The subscription ID to manage (ARM_SUBSCRIPTION_ID)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tenant_id", AttributeType::String)
                    .description("The AAD tenant to authenticate against (ARM_TENANT_ID)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_id", AttributeType::String)
                    .description("Client ID of the service principal (ARM_CLIENT_ID)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_secret", AttributeType::String)
                    .description("Client secret of the service principal (ARM_CLIENT_SECRET)")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("environment", AttributeType::String)
                    .description("The cloud environment: public, usgovernment or china")
                    .optional()
                    .validator(OneOfValidator::new(&["public", "usgovernment", "china"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Resource Manager endpoint override, mainly for testing")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];
        let config = &request.config;

        let subscription_id = config_or_env(config, "subscription_id", "ARM_SUBSCRIPTION_ID");
        let tenant_id = config_or_env(config, "tenant_id", "ARM_TENANT_ID");
        let client_id = config_or_env(config, "client_id", "ARM_CLIENT_ID");
        let client_secret = config_or_env(config, "client_secret", "ARM_CLIENT_SECRET");
        let environment = config_or_env(config, "environment", "ARM_ENVIRONMENT")
            .unwrap_or_else(|| "public".to_string());
        let endpoint_override = config_or_env(config, "endpoint", "ARM_ENDPOINT");

        let Some((default_endpoint, authority)) = environment_endpoints(&environment) else {
            diagnostics.push(Diagnostic::error(
                "Unknown environment",
                format!(
                    "{:?} is not a known environment (expected public, usgovernment or china)",
                    environment
                ),
            ));
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };

        let Some(subscription_id) = subscription_id else {
            diagnostics.push(Diagnostic::error(
                "Missing subscription",
                "subscription_id is required (set it in the provider block or via ARM_SUBSCRIPTION_ID)",
            ));
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };

        let endpoint = endpoint_override.unwrap_or_else(|| default_endpoint.to_string());
        let scope = format!("{}/.default", default_endpoint);

        // A static token (ARM_ACCESS_TOKEN) short-circuits the client
        // credentials flow; the mock-backed tests rely on this.
        let token_source = match std::env::var("ARM_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()) {
            Some(token) => TokenSource::static_token(token),
            None => match (tenant_id, client_id, client_secret) {
                (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                    TokenSource::client_secret(tenant_id, client_id, client_secret, authority, scope)
                }
                (None, _, _) => {
                    diagnostics.push(Diagnostic::error(
                        "Missing credentials",
                        "tenant_id is required (set it in the provider block or via ARM_TENANT_ID)",
                    ));
                    return ConfigureProviderResponse {
                        diagnostics,
                        provider_data: None,
                    };
                }
                (_, None, _) => {
                    diagnostics.push(Diagnostic::error(
                        "Missing credentials",
                        "client_id is required (set it in the provider block or via ARM_CLIENT_ID)",
                    ));
                    return ConfigureProviderResponse {
                        diagnostics,
                        provider_data: None,
                    };
                }
                (_, _, None) => {
                    diagnostics.push(Diagnostic::error(
                        "Missing credentials",
                        "client_secret is required (set it in the provider block or via ARM_CLIENT_SECRET)",
                    ));
                    return ConfigureProviderResponse {
                        diagnostics,
                        provider_data: None,
                    };
                }
            },
        };

        let arm = match ArmClient::new(&endpoint, token_source) {
            Ok(client) => client,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to build the Resource Manager client",
                    e.to_string(),
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        tracing::info!(
            request_id = %ctx.request_id(),
            subscription_id = %subscription_id,
            environment = %environment,
            "provider configured"
        );

        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(Arc::new(clients::Client::new(arm, subscription_id))),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();

        resources.insert(
            "azurerm_active_directory_domain_service".to_string(),
            Box::new(|| Box::new(services::domainservices::DomainServiceResource::new())),
        );
        resources.insert(
            "azurerm_active_directory_domain_service_replica_set".to_string(),
            Box::new(|| Box::new(services::domainservices::DomainServiceReplicaSetResource::new())),
        );
        resources.insert(
            "azurerm_analysis_services_server".to_string(),
            Box::new(|| Box::new(services::analysisservices::AnalysisServicesServerResource::new())),
        );
        resources.insert(
            "azurerm_attestation_provider".to_string(),
            Box::new(|| Box::new(services::attestation::AttestationProviderResource::new())),
        );
        resources.insert(
            "azurerm_confidential_ledger".to_string(),
            Box::new(|| Box::new(services::confidentialledger::ConfidentialLedgerResource::new())),
        );
        resources.insert(
            "azurerm_firewall".to_string(),
            Box::new(|| Box::new(services::firewall::FirewallResource::new())),
        );
        resources.insert(
            "azurerm_firewall_application_rule_collection".to_string(),
            Box::new(|| {
                Box::new(services::firewall::FirewallApplicationRuleCollectionResource::new())
            }),
        );
        resources.insert(
            "azurerm_lab_service_plan".to_string(),
            Box::new(|| Box::new(services::labservices::LabServicePlanResource::new())),
        );
        resources.insert(
            "azurerm_notification_hub".to_string(),
            Box::new(|| Box::new(services::notificationhub::NotificationHubResource::new())),
        );
        resources.insert(
            "azurerm_notification_hub_namespace".to_string(),
            Box::new(|| {
                Box::new(services::notificationhub::NotificationHubNamespaceResource::new())
            }),
        );
        resources.insert(
            "azurerm_powerbi_embedded".to_string(),
            Box::new(|| Box::new(services::powerbi::PowerBiEmbeddedResource::new())),
        );
        resources.insert(
            "azurerm_purview_account".to_string(),
            Box::new(|| Box::new(services::purview::PurviewAccountResource::new())),
        );
        resources.insert(
            "azurerm_user_assigned_identity".to_string(),
            Box::new(|| Box::new(services::msi::UserAssignedIdentityResource::new())),
        );

        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();

        data_sources.insert(
            "azurerm_attestation_provider".to_string(),
            Box::new(|| Box::new(services::attestation::AttestationProviderDataSource::new())),
        );
        data_sources.insert(
            "azurerm_purview_account".to_string(),
            Box::new(|| Box::new(services::purview::PurviewAccountDataSource::new())),
        );
        data_sources.insert(
            "azurerm_user_assigned_identity".to_string(),
            Box::new(|| Box::new(services::msi::UserAssignedIdentityDataSource::new())),
        );

        data_sources
    }
}
