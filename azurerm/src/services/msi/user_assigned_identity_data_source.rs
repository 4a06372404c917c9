//! azurerm_user_assigned_identity data source

use super::parse::UserAssignedIdentityId;
use crate::clients;
use crate::common;
use crate::tags;
use async_trait::async_trait;
use tfkit::context::Context;
use tfkit::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct UserAssignedIdentityDataSource {
    clients: Option<clients::Client>,
}

impl UserAssignedIdentityDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for UserAssignedIdentityDataSource {
    fn type_name(&self) -> &str {
        "azurerm_user_assigned_identity"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Gets information about an existing User Assigned Identity")
            .attribute(common::id_attribute())
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The name of the identity")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_group_name", AttributeType::String)
                    .description("The resource group the identity lives in")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("location", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("principal_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tenant_id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match request
            .provider_data
            .as_ref()
            .and_then(|data| data.downcast_ref::<clients::Client>())
        {
            Some(clients) => self.clients = Some(clients.clone()),
            None => diagnostics.push(common::provider_not_configured()),
        }
        ConfigureDataSourceResponse { diagnostics }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(clients) = &self.clients else {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![common::provider_not_configured()],
            };
        };

        let (name, resource_group) = match (
            request.config.get_string(&AttributePath::new("name")),
            request
                .config
                .get_string(&AttributePath::new("resource_group_name")),
        ) {
            (Ok(name), Ok(rg)) => (name, rg),
            _ => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Missing required argument",
                        "`name` and `resource_group_name` are required",
                    )],
                }
            }
        };

        let id = UserAssignedIdentityId::new(&clients.subscription_id, &resource_group, &name);

        match clients.msi.get(&id).await {
            Ok(model) => {
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
                    &AttributePath::new("principal_id"),
                    props.principal_id.unwrap_or_default(),
                );
                let _ = state.set_string(
                    &AttributePath::new("client_id"),
                    props.client_id.unwrap_or_default(),
                );
                let _ = state.set_string(
                    &AttributePath::new("tenant_id"),
                    props.tenant_id.unwrap_or_default(),
                );
                tags::flatten(&mut state, model.tags.as_ref());

                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                }
            }
            Err(e) if e.was_not_found() => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(
                    format!("{} was not found", id),
                    "the identity does not exist".to_string(),
                )],
            },
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(format!("retrieving {}", id), e.to_string())],
            },
        }
    }
}
