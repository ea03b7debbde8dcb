//! Long-running operation polling.
//!
//! ARM signals an asynchronous operation in one of three ways: an
//! `Azure-AsyncOperation` header pointing at a status monitor, a `Location`
//! header answered with 202 until the work is done, or a resource body whose
//! `properties.provisioningState` is not yet terminal.

use super::client::{ArmClient, ArmResponse};
use super::error::{parse_error_body, ArmError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use url::Url;

const AZURE_ASYNCOPERATION: &str = "azure-asyncoperation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LroStatus {
    Unknown,
    Succeeded,
    Canceled,
    Failed,
    InProgress,

    // seen in the wild
    Cancelled,
    Completed,
}

impl Display for LroStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LroStatus::Succeeded => "Succeeded",
            LroStatus::Canceled => "Canceled",
            LroStatus::Failed => "Failed",
            LroStatus::InProgress => "InProgress",
            LroStatus::Cancelled => "Cancelled",
            LroStatus::Completed => "Completed",
            LroStatus::Unknown => "<unknown>",
        };
        f.write_str(s)
    }
}

impl From<&str> for LroStatus {
    fn from(v: &str) -> Self {
        match v {
            "Succeeded" => LroStatus::Succeeded,
            "Canceled" => LroStatus::Canceled,
            "Failed" => LroStatus::Failed,
            "InProgress" => LroStatus::InProgress,
            "Cancelled" => LroStatus::Cancelled,
            "Completed" => LroStatus::Completed,
            _ => LroStatus::Unknown,
        }
    }
}

impl LroStatus {
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            LroStatus::Failed | LroStatus::Canceled | LroStatus::Cancelled
        )
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, LroStatus::Succeeded | LroStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_failed() || self.is_succeeded()
    }
}

fn json_field<'b>(body: &'b Value, path: &[&str]) -> Option<&'b str> {
    path.iter()
        .try_fold(body, |v, key| v.get(key))
        .and_then(Value::as_str)
}

/// `status` of an async operation monitor.
pub fn lro_status(body: &[u8]) -> Option<LroStatus> {
    let v: Value = serde_json::from_slice(body).ok()?;
    json_field(&v, &["status"]).map(LroStatus::from)
}

/// `properties.provisioningState` of a resource body.
pub fn provisioning_state(body: &[u8]) -> Option<LroStatus> {
    let v: Value = serde_json::from_slice(body).ok()?;
    json_field(&v, &["properties", "provisioningState"]).map(LroStatus::from)
}

/// Delay requested by the service, from `retry-after-ms`,
/// `x-ms-retry-after-ms` or `retry-after` (seconds or an HTTP date).
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &'static str| {
        headers
            .get(HeaderName::from_static(name))
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    };

    for name in ["retry-after-ms", "x-ms-retry-after-ms"] {
        if let Some(ms) = header(name).and_then(|v| v.parse::<u64>().ok()) {
            return Some(Duration::from_millis(ms));
        }
    }

    let v = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = v.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(v).ok()?;
    let wait = at.with_timezone(&Utc).signed_duration_since(Utc::now());
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

fn header_url(headers: &HeaderMap, name: &str) -> Result<Option<Url>> {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(v) if !v.is_empty() => Ok(Some(Url::parse(v)?)),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone)]
enum Strategy {
    AsyncOp { url: Url, location: Option<Url> },
    Location { url: Url },
    Body,
    Done,
}

/// In-flight long-running operation started by one of the `begin_*` calls.
#[derive(Debug)]
pub struct Poller<'a> {
    client: &'a ArmClient,
    method: Method,
    origin: Url,
    strategy: Strategy,
    resp: ArmResponse,
    status: LroStatus,
    timeout: Duration,
}

impl<'a> Poller<'a> {
    pub(crate) fn new(
        client: &'a ArmClient,
        method: Method,
        origin: Url,
        resp: ArmResponse,
    ) -> Result<Self> {
        let async_url = header_url(&resp.headers, AZURE_ASYNCOPERATION)?;
        let location = header_url(&resp.headers, LOCATION.as_str())?;

        let (strategy, status) = match (async_url, location) {
            (Some(url), location) => (
                Strategy::AsyncOp { url, location },
                provisioning_state(&resp.body).unwrap_or(LroStatus::InProgress),
            ),
            (None, Some(url)) if resp.status == StatusCode::ACCEPTED => {
                (Strategy::Location { url }, LroStatus::InProgress)
            }
            (None, _) if resp.status == StatusCode::ACCEPTED => {
                if method == Method::DELETE || method == Method::POST {
                    return Err(ArmError::MissingPollingUrl);
                }
                (Strategy::Body, LroStatus::InProgress)
            }
            (None, _) if method == Method::PUT || method == Method::PATCH => {
                match provisioning_state(&resp.body) {
                    Some(state) if !state.is_terminal() => (Strategy::Body, state),
                    Some(state) => (Strategy::Done, state),
                    None => (Strategy::Done, LroStatus::Succeeded),
                }
            }
            _ => (Strategy::Done, LroStatus::Succeeded),
        };
        log::debug!("{method} {origin} started, status {status}");

        Ok(Poller {
            client,
            method,
            origin,
            strategy,
            resp,
            status,
            timeout: client.lro_timeout(),
        })
    }

    /// Override the client's operation timeout for this operation only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn status(&self) -> LroStatus {
        self.status
    }

    pub fn done(&self) -> bool {
        self.status.is_terminal()
    }

    async fn get(&self, url: &Url) -> Result<ArmResponse> {
        self.client.send::<()>(Method::GET, url.clone(), None).await
    }

    /// Issue one status request and update the current state.
    pub async fn poll(&mut self) -> Result<LroStatus> {
        if self.done() {
            return Ok(self.status);
        }
        let resp = match &self.strategy {
            Strategy::AsyncOp { url, .. } => self.get(url).await?,
            Strategy::Location { url } => self.get(url).await?,
            Strategy::Body => self.get(&self.origin).await?,
            Strategy::Done => return Ok(self.status),
        };

        self.status = match &mut self.strategy {
            Strategy::AsyncOp { .. } => lro_status(&resp.body).ok_or_else(|| ArmError::Decode {
                path: "status".to_string(),
                message: "the response did not contain a status".to_string(),
            })?,
            Strategy::Location { url } => {
                if resp.status == StatusCode::ACCEPTED {
                    if let Some(next) = header_url(&resp.headers, LOCATION.as_str())? {
                        *url = next;
                    }
                    LroStatus::InProgress
                } else {
                    LroStatus::Succeeded
                }
            }
            Strategy::Body => provisioning_state(&resp.body).unwrap_or(LroStatus::Succeeded),
            Strategy::Done => self.status,
        };
        log::debug!("{} {} is {}", self.method, self.origin, self.status);
        self.resp = resp;
        Ok(self.status)
    }

    /// Poll until terminal, bounded by the operation timeout, and return the
    /// final response.
    pub async fn poll_until_done(mut self) -> Result<ArmResponse> {
        let limit = self.timeout;
        match tokio::time::timeout(limit, self.run()).await {
            Ok(result) => result,
            Err(_) => Err(ArmError::Timeout(limit)),
        }
    }

    async fn run(&mut self) -> Result<ArmResponse> {
        let frequency = self.client.poll_frequency();
        while !self.done() {
            let delay = retry_after(&self.resp.headers).unwrap_or(frequency);
            tokio::time::sleep(delay).await;
            self.poll().await?;
        }
        self.result().await
    }

    /// Poll until done and decode the final resource.
    pub async fn wait<T: DeserializeOwned>(self) -> Result<T> {
        self.poll_until_done().await?.json()
    }

    async fn result(&self) -> Result<ArmResponse> {
        if self.status.is_failed() {
            let detail = parse_error_body(&self.resp.body);
            let detail = match (detail.code.as_str(), detail.message.as_str()) {
                ("", m) => m.to_string(),
                (c, m) => format!("{c}: {m}"),
            };
            return Err(ArmError::OperationFailed {
                status: self.status.to_string(),
                detail,
            });
        }

        let is_put = self.method == Method::PUT || self.method == Method::PATCH;
        match &self.strategy {
            Strategy::AsyncOp { .. } | Strategy::Location { .. } if is_put => {
                self.get(&self.origin).await
            }
            Strategy::AsyncOp {
                location: Some(location),
                ..
            } if self.method == Method::POST => self.get(location).await,
            _ => Ok(self.resp.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_lro_status_from_str() {
        assert_eq!(LroStatus::from("Succeeded"), LroStatus::Succeeded);
        assert_eq!(LroStatus::from("Updating"), LroStatus::Unknown);
        assert!(LroStatus::from("Cancelled").is_failed());
        assert!(LroStatus::from("Completed").is_terminal());
        assert!(!LroStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_provisioning_state() {
        let body = br#"{"name":"vnet1","properties":{"provisioningState":"Updating"}}"#;
        assert_eq!(provisioning_state(body), Some(LroStatus::Unknown));
        let body = br#"{"properties":{"provisioningState":"Succeeded"}}"#;
        assert_eq!(provisioning_state(body), Some(LroStatus::Succeeded));
        assert_eq!(provisioning_state(b""), None);
        assert_eq!(provisioning_state(br#"{"properties":{}}"#), None);
    }

    #[test]
    fn test_lro_status_body() {
        assert_eq!(
            lro_status(br#"{"status":"InProgress"}"#),
            Some(LroStatus::InProgress)
        );
        assert_eq!(lro_status(br#"{"state":"x"}"#), None);
    }

    #[test]
    fn test_retry_after_ms_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static("250"));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("10"));
        assert_eq!(retry_after(&headers), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));

        let mut headers = HeaderMap::new();
        headers.insert("x-ms-retry-after-ms", HeaderValue::from_static("40"));
        assert_eq!(retry_after(&headers), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_retry_after_past_date_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_missing() {
        assert_eq!(retry_after(&HeaderMap::new()), None);
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }
}
