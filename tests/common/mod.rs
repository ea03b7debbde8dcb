//! Shared fixtures: a wiremock server standing in for the ARM metadata,
//! token and management endpoints of one stamp.

#![allow(dead_code)]

use azure_stack_samples::config::{AuthMode, SpConfig};
use azure_stack_samples::samples::{ConnectOptions, SampleContext};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const SUBSCRIPTION: &str = "7c1e6d2a-5d3b-4d0e-9a61-4f3f0c7b2e11";
pub const TENANT: &str = "2e7a6e3c-0b11-4c25-9a88-6f0fd3a1ac0e";
pub const TOKEN: &str = "tok";
pub const BEARER: &str = "Bearer tok";
pub const AUDIENCE: &str = "https://management.adfs.azurestack.local/0a4f21e8";

/// How the stamp authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    AzureAd,
    Adfs,
}

/// Mount the metadata document and a token endpoint; the token endpoint
/// expects exactly `token_requests` calls.
pub async fn mount_stamp(server: &MockServer, identity: Identity, token_requests: u64) {
    let (login, token_path) = match identity {
        Identity::AzureAd => (format!("{}/", server.uri()), format!("/{TENANT}/oauth2/token")),
        Identity::Adfs => (
            format!("{}/adfs/", server.uri()),
            "/adfs/oauth2/token".to_string(),
        ),
    };

    Mock::given(method("GET"))
        .and(path("/metadata/endpoints"))
        .and(query_param("api-version", "2015-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "galleryEndpoint": format!("{}/gallery/", server.uri()),
            "graphEndpoint": format!("{}/graph/", server.uri()),
            "portalEndpoint": format!("{}/portal/", server.uri()),
            "authentication": {
                "loginEndpoint": login,
                "audiences": [AUDIENCE]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(token_path))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "Bearer",
            "expires_in": "3600"
        })))
        .expect(token_requests)
        .mount(server)
        .await;
}

pub fn sp_config(server: &MockServer) -> SpConfig {
    SpConfig {
        client_id: "app-id".to_string(),
        client_secret: "s3cret".to_string(),
        object_id: "object-id".to_string(),
        subscription_id: SUBSCRIPTION.to_string(),
        tenant_id: TENANT.to_string(),
        resource_manager_endpoint_url: format!("{}/", server.uri()),
        location: "local".to_string(),
        ..Default::default()
    }
}

pub fn fast_options() -> ConnectOptions {
    ConnectOptions {
        poll_frequency: Duration::from_millis(10),
        lro_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// A connected context on an Azure AD stamp, with fast polling.
pub async fn connect(server: &MockServer) -> SampleContext {
    mount_stamp(server, Identity::AzureAd, 1).await;
    SampleContext::connect(sp_config(server), AuthMode::Secret, fast_options())
        .await
        .expect("connect to mock stamp")
}

pub fn rg_path(rg: &str) -> String {
    format!("/subscriptions/{SUBSCRIPTION}/resourcegroups/{rg}")
}

pub fn provider_path(rg: &str, resource_type: &str, name: &str) -> String {
    format!("{}/providers/{resource_type}/{name}", rg_path(rg))
}

pub fn resource_group_body(name: &str) -> serde_json::Value {
    json!({
        "id": rg_path(name),
        "name": name,
        "location": "local",
        "properties": { "provisioningState": "Succeeded" }
    })
}

/// Answer a resource group PUT synchronously.
pub async fn mount_resource_group(server: &MockServer, name: &str) {
    Mock::given(method("PUT"))
        .and(path(rg_path(name)))
        .respond_with(ResponseTemplate::new(201).set_body_json(resource_group_body(name)))
        .mount(server)
        .await;
}

/// Answers any ARM call with a provisioned resource whose id is the
/// request path.
pub struct ResourceEcho;

impl Respond for ResourceEcho {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request.url.path();
        let name = id.rsplit('/').next().unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "name": name,
            "location": "local",
            "properties": { "provisioningState": "Succeeded" }
        }))
    }
}

/// Let every PUT, GET and DELETE under the subscription succeed at once.
/// Mocks mounted with a higher priority still take precedence.
pub async fn mount_arm_echo(server: &MockServer) {
    for verb in ["PUT", "GET", "DELETE"] {
        Mock::given(method(verb))
            .and(path_regex(format!("^/subscriptions/{SUBSCRIPTION}/")))
            .respond_with(ResourceEcho)
            .with_priority(10)
            .mount(server)
            .await;
    }
}

/// Answer the storage account name check with an available name.
pub async fn mount_name_available(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Storage/checkNameAvailability"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nameAvailable": true })))
        .expect(expected_calls)
        .mount(server)
        .await;
}
