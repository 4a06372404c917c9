//! Shared helpers for the mock-backed resource tests.

use crate::api::{ArmClient, TokenSource};
use crate::clients;
use std::sync::Arc;
use tfkit::context::Context;
use tfkit::data_source::{ConfigureDataSourceRequest, DataSource};
use tfkit::resource::{ConfigureResourceRequest, Resource};

pub(crate) const TEST_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

pub(crate) fn test_clients(endpoint: &str) -> clients::Client {
    let arm = ArmClient::new(endpoint, TokenSource::static_token("test-token"))
        .expect("mock endpoint should be valid");
    clients::Client::new(arm, TEST_SUBSCRIPTION_ID.to_string())
}

pub(crate) async fn configure_resource<R: Resource>(resource: &mut R, clients: clients::Client) {
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(Arc::new(clients)),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
}

pub(crate) async fn configure_data_source<D: DataSource>(
    data_source: &mut D,
    clients: clients::Client,
) {
    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(Arc::new(clients)),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
}
