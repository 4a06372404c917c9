//! azurerm_active_directory_domain_service

use super::client::{
    bool_to_enabled, enabled_to_bool, DomainSecuritySettings, DomainService,
    DomainServiceProperties, LdapsSettings, NotificationSettings, ReplicaSet,
};
use super::parse::DomainServiceId;
use super::DOMAIN_SERVICE_RESOURCE_NAME;
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

const RESOURCE_TYPE: &str = "azurerm_active_directory_domain_service";

/// A replica set is only usable once this many domain controllers answer.
const MINIMUM_DOMAIN_CONTROLLERS: usize = 2;

#[derive(Default)]
pub struct DomainServiceResource {
    clients: Option<clients::Client>,
}

impl DomainServiceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replica_set_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("id".to_string(), AttributeType::String),
        ("subnet_id".to_string(), AttributeType::String),
        ("location".to_string(), AttributeType::String),
        (
            "domain_controller_ip_addresses".to_string(),
            AttributeType::List(Box::new(AttributeType::String)),
        ),
        ("service_status".to_string(), AttributeType::String),
    ]))
}

fn secure_ldap_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("enabled".to_string(), AttributeType::Bool),
        ("external_access_enabled".to_string(), AttributeType::Bool),
        ("pfx_certificate".to_string(), AttributeType::String),
        ("pfx_certificate_password".to_string(), AttributeType::String),
    ]))
}

fn notifications_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        (
            "additional_recipients".to_string(),
            AttributeType::Set(Box::new(AttributeType::String)),
        ),
        ("notify_dc_admins".to_string(), AttributeType::Bool),
        ("notify_global_admins".to_string(), AttributeType::Bool),
    ]))
}

fn security_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("ntlm_v1_enabled".to_string(), AttributeType::Bool),
        ("tls_v1_enabled".to_string(), AttributeType::Bool),
        ("sync_kerberos_passwords".to_string(), AttributeType::Bool),
        ("sync_ntlm_passwords".to_string(), AttributeType::Bool),
        ("sync_on_prem_passwords".to_string(), AttributeType::Bool),
    ]))
}

#[async_trait]
impl Resource for DomainServiceResource {
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
            .description("Manages an Active Directory Domain Service (Azure AD DS)")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the domain service")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(common::resource_group_name_attribute())
            .attribute(common::location_attribute())
            .attribute(
                AttributeBuilder::new("domain_name", AttributeType::String)
                    .description("The Active Directory domain to use")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sku", AttributeType::String)
                    .description("SKU of the domain service")
                    .required()
                    .validator(OneOfValidator::new(&["Standard", "Enterprise", "Premium"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("filtered_sync_enabled", AttributeType::Bool)
                    .description("Whether only scoped users and groups are synchronised")
                    .optional()
                    .default_value(Dynamic::Bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "initial_replica_set",
                    AttributeType::List(Box::new(replica_set_type())),
                )
                .description("The first replica set of the domain service")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "secure_ldap",
                    AttributeType::List(Box::new(secure_ldap_type())),
                )
                .description("Secure LDAP configuration")
                .optional()
                .sensitive()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "notifications",
                    AttributeType::List(Box::new(notifications_type())),
                )
                .description("Who is notified about service health")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("security", AttributeType::List(Box::new(security_type())))
                    .description("Legacy protocol and password sync settings")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("deployment_id", AttributeType::String)
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

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        match request
            .config
            .try_get_list(&AttributePath::new("initial_replica_set"))
        {
            Some(blocks) if blocks.len() == 1 => {
                let Dynamic::Map(fields) = &blocks[0] else {
                    return ValidateResourceConfigResponse { diagnostics };
                };
                if !matches!(fields.get("subnet_id"), Some(Dynamic::String(s)) if !s.is_empty()) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required argument",
                            "initial_replica_set needs a `subnet_id`",
                        )
                        .with_attribute(AttributePath::new("initial_replica_set").index(0)),
                    );
                }
            }
            Some(blocks) if blocks.len() > 1 => {
                diagnostics.push(
                    Diagnostic::error(
                        "Too many initial_replica_set blocks",
                        "exactly one initial replica set must be configured; add more through azurerm_active_directory_domain_service_replica_set",
                    )
                    .with_attribute(AttributePath::new("initial_replica_set")),
                );
            }
            _ => {}
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

        let id = DomainServiceId::new(&clients.subscription_id, &resource_group, &name);
        let _guard = locks::by_name(&name, DOMAIN_SERVICE_RESOURCE_NAME).await;

        match clients.domainservices.get(&id).await {
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

        let params = expand_domain_service(&request.planned_state);
        let written = match clients.domainservices.create_or_update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("creating {}", id), e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        // New deployments take up to an hour to roll out their domain
        // controllers; the service is unusable until both answer.
        let model =
            match wait_for_domain_controllers(clients, &id, written, &ctx).await {
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
            new_state: flatten_domain_service(&id, &model, &request.planned_state),
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

        let id = match DomainServiceId::parse(&raw_id) {
            Ok(id) => id,
            Err(e) => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e.to_string())],
                }
            }
        };

        match clients.domainservices.get(&id).await {
            Ok(model) => ReadResourceResponse {
                new_state: Some(flatten_domain_service(&id, &model, &request.current_state)),
                diagnostics,
            },
            Err(e) if e.was_not_found() => {
                tracing::info!(%id, "domain service was not found - removing from state");
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
            .and_then(|raw| DomainServiceId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let _guard = locks::by_name(&id.name, DOMAIN_SERVICE_RESOURCE_NAME).await;

        // Replica sets are owned by their own resource; carry the remote
        // list through the update untouched.
        let existing = match clients.domainservices.get(&id).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("retrieving {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let mut params = expand_domain_service(&request.planned_state);
        if let Some(properties) = params.properties.as_mut() {
            properties.replica_sets = existing
                .properties
                .as_ref()
                .and_then(|p| p.replica_sets.clone());
        }

        let written = match clients.domainservices.create_or_update(&id, &params).await {
            Ok(model) => model,
            Err(e) => {
                diagnostics.push(Diagnostic::error(format!("updating {}", id), e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let model = match wait_for_domain_controllers(clients, &id, written, &ctx).await {
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
            new_state: flatten_domain_service(&id, &model, &request.planned_state),
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
            .and_then(|raw| DomainServiceId::parse(&raw).map_err(|e| e.to_string()))
        {
            Ok(id) => id,
            Err(e) => {
                return DeleteResourceResponse {
                    diagnostics: vec![Diagnostic::error("Invalid resource ID", e)],
                }
            }
        };

        let _guard = locks::by_name(&id.name, DOMAIN_SERVICE_RESOURCE_NAME).await;

        match clients.domainservices.delete(&id).await {
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

        if let Err(e) = DomainServiceId::parse(&request.id) {
            response
                .diagnostics
                .push(Diagnostic::error("Invalid import ID", e.to_string()));
            return response;
        }

        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

/// Wait until provisioning finished and every replica set reports at least
/// two domain controller IP addresses.
pub(super) async fn wait_for_domain_controllers(
    clients: &clients::Client,
    id: &DomainServiceId,
    written: Option<DomainService>,
    ctx: &Context,
) -> Result<DomainService, String> {
    match written {
        Some(model) if domain_controller_state(&model) == "available" => return Ok(model),
        _ => {}
    }

    let refresh: RefreshFn<DomainService> = {
        let client = clients.domainservices.clone();
        let id = id.clone();
        Box::new(move || {
            let client = client.clone();
            let id = id.clone();
            Box::pin(async move {
                let service = client.get(&id).await?;
                let state = domain_controller_state(&service);
                Ok((service, state))
            })
        })
    };

    StateChangeConf {
        pending: vec!["pending".to_string()],
        target: vec!["available".to_string()],
        refresh,
        delay: Duration::from_secs(60),
        poll_interval: Duration::from_secs(60),
        timeout: Duration::from_secs(3 * 60 * 60),
        not_found_checks: 5,
    }
    .wait_for_state(ctx)
    .await
    .map_err(|e| e.to_string())
}

pub(super) fn domain_controller_state(model: &DomainService) -> String {
    let Some(properties) = &model.properties else {
        return "pending".to_string();
    };

    if properties.provisioning_state.as_deref() != Some("Succeeded") {
        return "pending".to_string();
    }

    let all_ready = properties
        .replica_sets
        .as_deref()
        .unwrap_or_default()
        .iter()
        .all(|set| {
            set.domain_controller_ip_addresses
                .as_deref()
                .unwrap_or_default()
                .len()
                >= MINIMUM_DOMAIN_CONTROLLERS
        });

    if all_ready { "available" } else { "pending" }.to_string()
}

fn bool_field(fields: &HashMap<String, Dynamic>, key: &str, default: bool) -> bool {
    match fields.get(key) {
        Some(Dynamic::Bool(b)) => *b,
        _ => default,
    }
}

fn expand_domain_service(config: &DynamicValue) -> DomainService {
    let location = config
        .try_get_string(&AttributePath::new("location"))
        .map(|l| common::normalize_location(&l));

    let replica_sets = config
        .try_get_list(&AttributePath::new("initial_replica_set"))
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| {
                    let Dynamic::Map(fields) = block else { return None };
                    let subnet_id = match fields.get("subnet_id") {
                        Some(Dynamic::String(s)) => Some(s.clone()),
                        _ => None,
                    };
                    Some(ReplicaSet {
                        replica_set_id: None,
                        location: location.clone(),
                        subnet_id,
                        domain_controller_ip_addresses: None,
                        service_status: None,
                    })
                })
                .collect::<Vec<_>>()
        });

    let ldaps_settings = config
        .try_get_list(&AttributePath::new("secure_ldap"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => {
                let get = |key: &str| match fields.get(key) {
                    Some(Dynamic::String(s)) if !s.is_empty() => Some(s.clone()),
                    _ => None,
                };
                Some(LdapsSettings {
                    ldaps: Some(bool_to_enabled(bool_field(&fields, "enabled", false))),
                    external_access: Some(bool_to_enabled(bool_field(
                        &fields,
                        "external_access_enabled",
                        false,
                    ))),
                    pfx_certificate: get("pfx_certificate"),
                    pfx_certificate_password: get("pfx_certificate_password"),
                })
            }
            _ => None,
        });

    let notification_settings = config
        .try_get_list(&AttributePath::new("notifications"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => {
                let additional_recipients = match fields.get("additional_recipients") {
                    Some(Dynamic::List(items)) => Some(common::expand_string_list(items)),
                    _ => None,
                };
                Some(NotificationSettings {
                    notify_global_admins: Some(bool_to_enabled(bool_field(
                        &fields,
                        "notify_global_admins",
                        true,
                    ))),
                    notify_dc_admins: Some(bool_to_enabled(bool_field(
                        &fields,
                        "notify_dc_admins",
                        true,
                    ))),
                    additional_recipients,
                })
            }
            _ => None,
        });

    let domain_security_settings = config
        .try_get_list(&AttributePath::new("security"))
        .and_then(|blocks| blocks.into_iter().next())
        .and_then(|block| match block {
            Dynamic::Map(fields) => Some(DomainSecuritySettings {
                ntlm_v1: Some(bool_to_enabled(bool_field(&fields, "ntlm_v1_enabled", false))),
                tls_v1: Some(bool_to_enabled(bool_field(&fields, "tls_v1_enabled", false))),
                sync_kerberos_passwords: Some(bool_to_enabled(bool_field(
                    &fields,
                    "sync_kerberos_passwords",
                    false,
                ))),
                sync_ntlm_passwords: Some(bool_to_enabled(bool_field(
                    &fields,
                    "sync_ntlm_passwords",
                    false,
                ))),
                sync_on_prem_passwords: Some(bool_to_enabled(bool_field(
                    &fields,
                    "sync_on_prem_passwords",
                    false,
                ))),
            }),
            _ => None,
        });

    DomainService {
        location,
        tags: tags::expand(config),
        properties: Some(DomainServiceProperties {
            domain_name: config.try_get_string(&AttributePath::new("domain_name")),
            sku: config.try_get_string(&AttributePath::new("sku")),
            filtered_sync: Some(bool_to_enabled(
                config
                    .try_get_bool(&AttributePath::new("filtered_sync_enabled"))
                    .unwrap_or(false),
            )),
            replica_sets,
            ldaps_settings,
            notification_settings,
            domain_security_settings,
            deployment_id: None,
            provisioning_state: None,
        }),
    }
}

pub(super) fn flatten_replica_set(id: &DomainServiceId, set: &ReplicaSet) -> Dynamic {
    let replica_set_id = set.replica_set_id.clone().unwrap_or_default();
    let full_id = if replica_set_id.is_empty() {
        String::new()
    } else {
        format!("{}/replicaSets/{}", id, replica_set_id)
    };

    Dynamic::Map(HashMap::from([
        ("id".to_string(), Dynamic::String(full_id)),
        (
            "subnet_id".to_string(),
            Dynamic::String(set.subnet_id.clone().unwrap_or_default()),
        ),
        (
            "location".to_string(),
            Dynamic::String(common::normalize_location(
                set.location.as_deref().unwrap_or_default(),
            )),
        ),
        (
            "domain_controller_ip_addresses".to_string(),
            Dynamic::List(common::string_list(
                set.domain_controller_ip_addresses.as_deref().unwrap_or_default(),
            )),
        ),
        (
            "service_status".to_string(),
            Dynamic::String(set.service_status.clone().unwrap_or_default()),
        ),
    ]))
}

fn flatten_domain_service(
    id: &DomainServiceId,
    model: &DomainService,
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

    let props = model.properties.clone().unwrap_or_default();
    let _ = state.set_string(
        &AttributePath::new("domain_name"),
        props.domain_name.unwrap_or_default(),
    );
    let _ = state.set_string(&AttributePath::new("sku"), props.sku.unwrap_or_default());
    let _ = state.set_bool(
        &AttributePath::new("filtered_sync_enabled"),
        enabled_to_bool(props.filtered_sync.as_deref()),
    );

    // Only the first replica set belongs to this resource; the rest are
    // azurerm_active_directory_domain_service_replica_set instances.
    let initial = props
        .replica_sets
        .as_deref()
        .unwrap_or_default()
        .first()
        .map(|set| vec![flatten_replica_set(id, set)])
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("initial_replica_set"), initial);

    let secure_ldap = props
        .ldaps_settings
        .map(|settings| {
            // Certificate material is write-only; preserve the config.
            let (pfx, pfx_password) = config
                .try_get_list(&AttributePath::new("secure_ldap"))
                .and_then(|blocks| blocks.into_iter().next())
                .map(|block| match block {
                    Dynamic::Map(fields) => {
                        let get = |key: &str| match fields.get(key) {
                            Some(Dynamic::String(s)) => s.clone(),
                            _ => String::new(),
                        };
                        (get("pfx_certificate"), get("pfx_certificate_password"))
                    }
                    _ => (String::new(), String::new()),
                })
                .unwrap_or_default();

            vec![Dynamic::Map(HashMap::from([
                (
                    "enabled".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.ldaps.as_deref())),
                ),
                (
                    "external_access_enabled".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.external_access.as_deref())),
                ),
                ("pfx_certificate".to_string(), Dynamic::String(pfx)),
                (
                    "pfx_certificate_password".to_string(),
                    Dynamic::String(pfx_password),
                ),
            ]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("secure_ldap"), secure_ldap);

    let notifications = props
        .notification_settings
        .map(|settings| {
            vec![Dynamic::Map(HashMap::from([
                (
                    "additional_recipients".to_string(),
                    Dynamic::List(common::string_list(
                        settings.additional_recipients.as_deref().unwrap_or_default(),
                    )),
                ),
                (
                    "notify_dc_admins".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.notify_dc_admins.as_deref())),
                ),
                (
                    "notify_global_admins".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.notify_global_admins.as_deref())),
                ),
            ]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("notifications"), notifications);

    let security = props
        .domain_security_settings
        .map(|settings| {
            vec![Dynamic::Map(HashMap::from([
                (
                    "ntlm_v1_enabled".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.ntlm_v1.as_deref())),
                ),
                (
                    "tls_v1_enabled".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.tls_v1.as_deref())),
                ),
                (
                    "sync_kerberos_passwords".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.sync_kerberos_passwords.as_deref())),
                ),
                (
                    "sync_ntlm_passwords".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.sync_ntlm_passwords.as_deref())),
                ),
                (
                    "sync_on_prem_passwords".to_string(),
                    Dynamic::Bool(enabled_to_bool(settings.sync_on_prem_passwords.as_deref())),
                ),
            ]))]
        })
        .unwrap_or_default();
    let _ = state.set_list(&AttributePath::new("security"), security);

    let _ = state.set_string(
        &AttributePath::new("deployment_id"),
        props.deployment_id.unwrap_or_default(),
    );

    tags::flatten(&mut state, model.tags.as_ref());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{configure_resource, test_clients};

    const SERVICE_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.AAD/domainServices/aadds";
    const SUBNET_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/aadds-subnet";

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "aadds".to_string());
        let _ = config.set_string(
            &AttributePath::new("resource_group_name"),
            "rg-1".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("location"), "westeurope".to_string());
        let _ = config.set_string(
            &AttributePath::new("domain_name"),
            "aadds.example.com".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("sku"), "Standard".to_string());
        let _ = config.set_list(
            &AttributePath::new("initial_replica_set"),
            vec![Dynamic::Map(HashMap::from([(
                "subnet_id".to_string(),
                Dynamic::String(SUBNET_ID.to_string()),
            )]))],
        );
        config
    }

    #[test]
    fn domain_controller_state_requires_two_controllers_per_replica_set() {
        let mut model = DomainService {
            properties: Some(DomainServiceProperties {
                provisioning_state: Some("Succeeded".to_string()),
                replica_sets: Some(vec![ReplicaSet {
                    domain_controller_ip_addresses: Some(vec!["10.0.1.4".to_string()]),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(domain_controller_state(&model), "pending");

        if let Some(set) = model
            .properties
            .as_mut()
            .and_then(|p| p.replica_sets.as_mut())
            .and_then(|sets| sets.first_mut())
        {
            set.domain_controller_ip_addresses =
                Some(vec!["10.0.1.4".to_string(), "10.0.1.5".to_string()]);
        }
        assert_eq!(domain_controller_state(&model), "available");
    }

    #[test]
    fn domain_controller_state_waits_for_provisioning() {
        let model = DomainService {
            properties: Some(DomainServiceProperties {
                provisioning_state: Some("Updating".to_string()),
                replica_sets: Some(vec![]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(domain_controller_state(&model), "pending");
    }

    #[test]
    fn expand_translates_security_flags() {
        let mut config = test_config();
        let _ = config.set_list(
            &AttributePath::new("security"),
            vec![Dynamic::Map(HashMap::from([
                ("ntlm_v1_enabled".to_string(), Dynamic::Bool(true)),
                ("sync_kerberos_passwords".to_string(), Dynamic::Bool(true)),
            ]))],
        );

        let service = expand_domain_service(&config);
        let security = service
            .properties
            .unwrap()
            .domain_security_settings
            .unwrap();
        assert_eq!(security.ntlm_v1.as_deref(), Some("Enabled"));
        assert_eq!(security.tls_v1.as_deref(), Some("Disabled"));
        assert_eq!(security.sync_kerberos_passwords.as_deref(), Some("Enabled"));
    }

    #[tokio::test]
    async fn validate_rejects_multiple_initial_replica_sets() {
        let resource = DomainServiceResource::new();
        let mut config = test_config();
        let block = Dynamic::Map(HashMap::from([(
            "subnet_id".to_string(),
            Dynamic::String(SUBNET_ID.to_string()),
        )]));
        let _ = config.set_list(
            &AttributePath::new("initial_replica_set"),
            vec![block.clone(), block],
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
            .summary
            .contains("Too many initial_replica_set"));
    }

    #[tokio::test]
    async fn create_waits_until_domain_controllers_are_up() {
        let mut server = mockito::Server::new_async().await;
        let _guard = server
            .mock("GET", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":"ResourceNotFound","message":"not found"}}"#)
            .create_async()
            .await;
        let _put = server
            .mock("PUT", SERVICE_PATH)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "location": "westeurope",
                    "properties": {
                        "provisioningState": "Succeeded",
                        "domainName": "aadds.example.com",
                        "sku": "Standard",
                        "filteredSync": "Disabled",
                        "deploymentId": "d-1",
                        "replicaSets": [{
                            "replicaSetId": "rs-1",
                            "location": "westeurope",
                            "subnetId": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg-1/providers/Microsoft.Network/virtualNetworks/vnet-1/subnets/aadds-subnet",
                            "domainControllerIpAddresses": ["10.0.1.4", "10.0.1.5"],
                            "serviceStatus": "Running"
                        }]
                    }
                }"#,
            )
            .create_async()
            .await;

        let mut resource = DomainServiceResource::new();
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
        let replica_sets = response
            .new_state
            .get_list(&AttributePath::new("initial_replica_set"))
            .unwrap();
        assert_eq!(replica_sets.len(), 1);
        let Dynamic::Map(fields) = &replica_sets[0] else {
            panic!("expected replica set object");
        };
        assert_eq!(
            fields.get("domain_controller_ip_addresses"),
            Some(&Dynamic::List(vec![
                Dynamic::String("10.0.1.4".to_string()),
                Dynamic::String("10.0.1.5".to_string()),
            ]))
        );
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("deployment_id"))
                .unwrap(),
            "d-1"
        );
    }
}
