//! End-to-end lifecycle test: drives the gRPC service implementation with
//! an in-memory provider, through the same protobuf types Terraform uses.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio_test::assert_ok;
use std::sync::{Arc, Mutex};
use tfkit::context::Context;
use tfkit::grpc::GrpcProviderServer;
use tfkit::proto;
use tfkit::proto::ProviderService;
use tfkit::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
};
use tfkit::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfkit::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfkit::types::{AttributePath, Dynamic, DynamicValue};
use tonic::Request;

#[derive(Clone, Default)]
struct WidgetStore {
    widgets: Arc<Mutex<HashMap<String, String>>>,
}

#[derive(Default)]
struct WidgetProvider {
    store: WidgetStore,
}

#[async_trait]
impl Provider for WidgetProvider {
    fn type_name(&self) -> &str {
        "widget"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(self.store.clone())),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "widget_thing".to_string(),
            Box::new(|| Box::new(WidgetResource::default())),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        HashMap::new()
    }
}

#[derive(Default)]
struct WidgetResource {
    store: Option<WidgetStore>,
}

#[async_trait]
impl Resource for WidgetResource {
    fn type_name(&self) -> &str {
        "widget_thing"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .computed()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("name", AttributeType::String)
                        .required()
                        .force_new()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("color", AttributeType::String)
                        .optional()
                        .default_value(Dynamic::String("blue".to_string()))
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        self.store = request
            .provider_data
            .as_ref()
            .and_then(|data| data.downcast_ref::<WidgetStore>())
            .cloned();
        ConfigureResourceResponse {
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let store = self.store.as_ref().expect("resource not configured");
        let name = request
            .config
            .get_string(&AttributePath::new("name"))
            .expect("name is required");
        let color = request
            .planned_state
            .try_get_string(&AttributePath::new("color"))
            .unwrap_or_else(|| "blue".to_string());

        store
            .widgets
            .lock()
            .unwrap()
            .insert(name.clone(), color.clone());

        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("id"), format!("widgets/{}", name));
        let _ = state.set_string(&AttributePath::new("name"), name);
        let _ = state.set_string(&AttributePath::new("color"), color);

        CreateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let store = self.store.as_ref().expect("resource not configured");
        let Ok(name) = request.current_state.get_string(&AttributePath::new("name")) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            };
        };

        match store.widgets.lock().unwrap().get(&name) {
            Some(color) => {
                let mut state = DynamicValue::empty_object();
                let _ = state.set_string(&AttributePath::new("id"), format!("widgets/{}", name));
                let _ = state.set_string(&AttributePath::new("name"), name.clone());
                let _ = state.set_string(&AttributePath::new("color"), color.clone());
                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics: vec![],
                }
            }
            None => ReadResourceResponse {
                new_state: None,
                diagnostics: vec![],
            },
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let store = self.store.as_ref().expect("resource not configured");
        let name = request
            .planned_state
            .get_string(&AttributePath::new("name"))
            .expect("name is required");
        let color = request
            .planned_state
            .try_get_string(&AttributePath::new("color"))
            .unwrap_or_else(|| "blue".to_string());

        store
            .widgets
            .lock()
            .unwrap()
            .insert(name.clone(), color.clone());

        UpdateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let store = self.store.as_ref().expect("resource not configured");
        if let Ok(name) = request.prior_state.get_string(&AttributePath::new("name")) {
            store.widgets.lock().unwrap().remove(&name);
        }
        DeleteResourceResponse {
            diagnostics: vec![],
        }
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
        tfkit::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

fn encode(value: &DynamicValue) -> Option<proto::DynamicValue> {
    Some(proto::DynamicValue {
        msgpack: value.encode_msgpack().expect("encoding cannot fail"),
        json: vec![],
    })
}

fn decode(value: &Option<proto::DynamicValue>) -> DynamicValue {
    DynamicValue::decode_msgpack(&value.as_ref().expect("value must be present").msgpack)
        .expect("decoding cannot fail")
}

async fn configured_server() -> GrpcProviderServer<WidgetProvider> {
    let server = GrpcProviderServer::new(WidgetProvider::default());
    let response = server
        .configure_provider(Request::new(proto::configure_provider::Request {
            terraform_version: "1.9.0".to_string(),
            config: encode(&DynamicValue::empty_object()),
            client_capabilities: None,
        }))
        .await
        .expect("configure must succeed");
    assert!(response.into_inner().diagnostics.is_empty());
    server
}

#[tokio::test]
async fn schema_lists_resource_types() {
    let server = configured_server().await;

    let response = assert_ok!(
        server
            .get_provider_schema(Request::new(proto::get_provider_schema::Request {}))
            .await
    )
    .into_inner();

    assert!(response.resource_schemas.contains_key("widget_thing"));
    let schema = &response.resource_schemas["widget_thing"];
    let block = schema.block.as_ref().expect("schema has a block");
    let id = block
        .attributes
        .iter()
        .find(|a| a.name == "id")
        .expect("id attribute");
    assert!(id.computed);
}

#[tokio::test]
async fn full_create_read_delete_lifecycle() {
    let server = configured_server().await;

    let mut config = DynamicValue::empty_object();
    config
        .set_string(&AttributePath::new("name"), "w1".to_string())
        .unwrap();

    // Plan the create: computed id becomes unknown, default color applies.
    let plan = server
        .plan_resource_change(Request::new(proto::plan_resource_change::Request {
            type_name: "widget_thing".to_string(),
            prior_state: encode(&DynamicValue::null()),
            proposed_new_state: encode(&config),
            config: encode(&config),
            prior_private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    let planned = decode(&plan.planned_state);
    assert_eq!(planned.value_at(&AttributePath::new("id")), Dynamic::Unknown);
    assert_eq!(
        planned.value_at(&AttributePath::new("color")),
        Dynamic::String("blue".to_string())
    );

    // Apply the create.
    let apply = server
        .apply_resource_change(Request::new(proto::apply_resource_change::Request {
            type_name: "widget_thing".to_string(),
            prior_state: encode(&DynamicValue::null()),
            planned_state: plan.planned_state.clone(),
            config: encode(&config),
            planned_private: vec![],
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(apply.diagnostics.is_empty(), "{:?}", apply.diagnostics);
    let created = decode(&apply.new_state);
    assert_eq!(
        created.get_string(&AttributePath::new("id")).unwrap(),
        "widgets/w1"
    );

    // Refresh sees the widget.
    let read = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "widget_thing".to_string(),
            current_state: apply.new_state.clone(),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    let refreshed = decode(&read.new_state);
    assert_eq!(
        refreshed.get_string(&AttributePath::new("color")).unwrap(),
        "blue"
    );

    // Destroy.
    let destroy = server
        .apply_resource_change(Request::new(proto::apply_resource_change::Request {
            type_name: "widget_thing".to_string(),
            prior_state: apply.new_state.clone(),
            planned_state: encode(&DynamicValue::null()),
            config: encode(&DynamicValue::null()),
            planned_private: vec![],
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(destroy.diagnostics.is_empty());
    assert!(decode(&destroy.new_state).is_null());

    // A refresh after destroy reports the widget gone.
    let read = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "widget_thing".to_string(),
            current_state: apply.new_state.clone(),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(decode(&read.new_state).is_null());
}

#[tokio::test]
async fn plan_flags_force_new_change() {
    let server = configured_server().await;

    let mut prior = DynamicValue::empty_object();
    prior
        .set_string(&AttributePath::new("id"), "widgets/old".to_string())
        .unwrap();
    prior
        .set_string(&AttributePath::new("name"), "old".to_string())
        .unwrap();
    prior
        .set_string(&AttributePath::new("color"), "blue".to_string())
        .unwrap();

    let mut config = DynamicValue::empty_object();
    config
        .set_string(&AttributePath::new("name"), "new".to_string())
        .unwrap();
    let mut proposed = config.clone();
    proposed
        .set_string(&AttributePath::new("id"), "widgets/old".to_string())
        .unwrap();

    let plan = server
        .plan_resource_change(Request::new(proto::plan_resource_change::Request {
            type_name: "widget_thing".to_string(),
            prior_state: encode(&prior),
            proposed_new_state: encode(&proposed),
            config: encode(&config),
            prior_private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(plan.requires_replace.len(), 1);
    let step = &plan.requires_replace[0].steps[0];
    assert_eq!(
        step.selector,
        Some(proto::attribute_path::step::Selector::AttributeName(
            "name".to_string()
        ))
    );
}

#[tokio::test]
async fn validate_reports_missing_required_attribute() {
    let server = configured_server().await;

    let config = DynamicValue::empty_object();
    let response = server
        .validate_resource_config(Request::new(proto::validate_resource_config::Request {
            type_name: "widget_thing".to_string(),
            config: encode(&config),
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("\"name\" is required"));
}

#[tokio::test]
async fn import_seeds_state_with_id() {
    let server = configured_server().await;

    let response = server
        .import_resource_state(Request::new(proto::import_resource_state::Request {
            type_name: "widget_thing".to_string(),
            id: "widgets/imported".to_string(),
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.imported_resources.len(), 1);
    let state = decode(&response.imported_resources[0].state);
    assert_eq!(
        state.get_string(&AttributePath::new("id")).unwrap(),
        "widgets/imported"
    );
}

#[tokio::test]
async fn unknown_resource_type_is_a_diagnostic() {
    let server = configured_server().await;

    let response = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "widget_missing".to_string(),
            current_state: encode(&DynamicValue::empty_object()),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].summary.contains("Unknown resource type"));
}
