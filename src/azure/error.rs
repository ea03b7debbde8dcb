//! Errors raised by the ARM client layer.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to Azure Resource Manager, the token endpoint or the
/// metadata endpoint.
#[derive(Debug, Error)]
pub enum ArmError {
    /// The service answered with a non-success status.
    #[error("{method} {url}: StatusCode={status} Code=\"{code}\" Message=\"{message}\"")]
    Http {
        method: String,
        url: String,
        status: StatusCode,
        code: String,
        message: String,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    /// The body did not match the expected shape.
    #[error("error decoding response: path={path} error={message}")]
    Decode { path: String, message: String },
    #[error("long-running operation ended with status {status}: {detail}")]
    OperationFailed { status: String, detail: String },
    #[error("timed out after {0:?} waiting for the operation to complete")]
    Timeout(Duration),
    #[error("response is missing polling URL")]
    MissingPollingUrl,
    #[error("authentication failed: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, ArmError>;

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize, Default)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Pull `code`/`message` out of an ARM error body.
///
/// ARM nests them under `error`; a few resource providers put them at the top
/// level. Anything else yields an empty code and the raw body as message.
pub(crate) fn parse_error_body(body: &[u8]) -> ErrorDetail {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Some(detail),
            ..
        }) => detail,
        Ok(ErrorEnvelope {
            code: Some(code),
            message,
            ..
        }) => ErrorDetail {
            code,
            message: message.unwrap_or_default(),
        },
        _ => ErrorDetail {
            code: String::new(),
            message: String::from_utf8_lossy(body).trim().to_string(),
        },
    }
}

impl ArmError {
    pub(crate) fn from_response(method: &str, url: &str, status: StatusCode, body: &[u8]) -> Self {
        let detail = parse_error_body(body);
        ArmError::Http {
            method: method.to_string(),
            url: url.to_string(),
            status,
            code: detail.code,
            message: detail.message,
        }
    }

    pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        ArmError::Decode {
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        }
    }

    /// HTTP status of the failed call, when the failure was an HTTP answer.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ArmError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
