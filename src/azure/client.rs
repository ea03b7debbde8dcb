//! Azure Resource Manager REST client.

use super::error::{ArmError, Result};
use super::iam::Credential;
use super::poller::Poller;
use super::profile::ApiProfile;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default wait between two polls when the service sends no Retry-After.
pub const DEFAULT_POLL_FREQUENCY: Duration = Duration::from_secs(5);

/// Default bound on a single long-running operation.
pub const DEFAULT_LRO_TIMEOUT: Duration = Duration::from_secs(60);

/// Bound on creates that take minutes on a stamp: virtual machines and
/// storage accounts.
pub const PROVISIONING_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Raw answer of a successful call.
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ArmResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let mut de = serde_json::Deserializer::from_slice(&self.body);
        serde_path_to_error::deserialize(&mut de).map_err(ArmError::decode)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    next_link: Option<String>,
}

/// Authenticated client bound to one subscription and API profile.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    subscription_id: String,
    credential: Arc<Credential>,
    profile: ApiProfile,
    poll_frequency: Duration,
    lro_timeout: Duration,
}

impl ArmClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        subscription_id: &str,
        credential: Arc<Credential>,
        profile: ApiProfile,
    ) -> Result<Self> {
        Ok(ArmClient {
            http,
            endpoint: Url::parse(endpoint)?,
            subscription_id: subscription_id.to_string(),
            credential,
            profile,
            poll_frequency: DEFAULT_POLL_FREQUENCY,
            lro_timeout: DEFAULT_LRO_TIMEOUT,
        })
    }

    /// Same identity and subscription, different API profile.
    pub fn with_profile(&self, profile: ApiProfile) -> Self {
        ArmClient {
            profile,
            ..self.clone()
        }
    }

    pub fn with_poll_frequency(mut self, frequency: Duration) -> Self {
        self.poll_frequency = frequency;
        self
    }

    pub fn with_lro_timeout(mut self, timeout: Duration) -> Self {
        self.lro_timeout = timeout;
        self
    }

    pub fn profile(&self) -> &ApiProfile {
        &self.profile
    }

    pub fn poll_frequency(&self) -> Duration {
        self.poll_frequency
    }

    pub fn lro_timeout(&self) -> Duration {
        self.lro_timeout
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn subscription_path(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }

    pub fn resource_group_path(&self, resource_group: &str) -> String {
        format!("{}/resourcegroups/{resource_group}", self.subscription_path())
    }

    /// `.../resourcegroups/{rg}/providers/{resource_type}/{name}`, e.g. with
    /// `Microsoft.Network/virtualNetworks`.
    pub fn provider_path(&self, resource_group: &str, resource_type: &str, name: &str) -> String {
        format!(
            "{}/providers/{resource_type}/{name}",
            self.resource_group_path(resource_group)
        )
    }

    pub fn url(&self, path: &str, api_version: &str) -> Result<Url> {
        let mut url = self.endpoint.join(path)?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Send one authenticated request. Non-2xx answers become `ArmError::Http`.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<ArmResponse> {
        let token = self.credential.get_token().await?;
        log::debug!("{method} {url}");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body).map_err(|e| ArmError::Decode {
                    path: ".".to_string(),
                    message: e.to_string(),
                })?);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        log::trace!("{method} {url} -> {status} ({} bytes)", body.len());

        if !status.is_success() {
            log::warn!("{method} {url} failed with {status}");
            return Err(ArmError::from_response(
                method.as_str(),
                url.as_str(),
                status,
                &body,
            ));
        }
        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T> {
        let url = self.url(path, api_version)?;
        self.send::<()>(Method::GET, url, None).await?.json()
    }

    /// PUT that completes synchronously.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path, api_version)?;
        self.send(Method::PUT, url, Some(body)).await?.json()
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path, api_version)?;
        self.send(Method::POST, url, body).await?.json()
    }

    /// DELETE that completes synchronously.
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<StatusCode> {
        let url = self.url(path, api_version)?;
        Ok(self.send::<()>(Method::DELETE, url, None).await?.status)
    }

    /// Start a PUT that may run as a long-running operation.
    pub async fn begin_put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<Poller<'_>> {
        let url = self.url(path, api_version)?;
        let resp = self.send(Method::PUT, url.clone(), Some(body)).await?;
        Poller::new(self, Method::PUT, url, resp)
    }

    /// Start a DELETE that may run as a long-running operation.
    pub async fn begin_delete(&self, path: &str, api_version: &str) -> Result<Poller<'_>> {
        let url = self.url(path, api_version)?;
        let resp = self.send::<()>(Method::DELETE, url.clone(), None).await?;
        Poller::new(self, Method::DELETE, url, resp)
    }

    /// GET a list and follow `nextLink` until the last page.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut url = self.url(path, api_version)?;
        url.query_pairs_mut().extend_pairs(query);

        let mut items = vec![];
        let mut page_count = 0;
        loop {
            let page: Page<T> = self.send::<()>(Method::GET, url.clone(), None).await?.json()?;
            page_count += 1;
            items.extend(page.value);
            log::debug!("got page#{page_count} => {} items", items.len());

            match page.next_link.filter(|l| !l.is_empty()) {
                Some(next) => {
                    let next = Url::parse(&next)?;
                    if next == url {
                        log::warn!("nextLink repeats the current page, stopping");
                        break;
                    }
                    url = next;
                }
                None => break,
            }
        }
        Ok(items)
    }
}
