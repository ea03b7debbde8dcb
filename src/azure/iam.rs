//! Service principal authentication.
//!
//! Tokens are requested with the OAuth2 v1 client credentials grant, which
//! both Azure AD and the ADFS instance of a disconnected Azure Stack Hub
//! accept. The secret flow sends the client secret; the certificate flow
//! sends an RS256 client assertion signed with the principal's key.

use super::error::{ArmError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::error::Error;
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;
use url::Url;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
const ASSERTION_LIFETIME_MINUTES: i64 = 10;

/// Tokens this close to expiry are refreshed before use.
fn refresh_margin() -> Duration {
    Duration::minutes(5)
}

/// Token endpoint of `tenant` under `authority`.
///
/// The authority is treated as a base URL without a trailing slash, so an
/// ADFS authority `https://adfs.host/adfs` with tenant `adfs` resolves to
/// `https://adfs.host/adfs/oauth2/token`.
pub fn token_endpoint(authority: &str, tenant: &str) -> std::result::Result<Url, url::ParseError> {
    let base = Url::parse(authority.trim_end_matches('/'))?;
    base.join(&format!("{tenant}/oauth2/token"))
}

/// X.509 certificate plus RSA private key of a service principal.
#[derive(Clone)]
pub struct ClientCertificate {
    der: Vec<u8>,
    private_key_pem: Vec<u8>,
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("thumbprint", &self.thumbprint())
            .finish()
    }
}

impl ClientCertificate {
    /// Parse a PEM bundle holding one `CERTIFICATE` block and one
    /// unencrypted `PRIVATE KEY` or `RSA PRIVATE KEY` block.
    pub fn from_pem(pem: &str) -> std::result::Result<Self, Box<dyn Error>> {
        let blocks =
            pem::parse_many(pem).map_err(|e| format!("Invalid PEM certificate file: {e}"))?;
        let mut der = None;
        let mut private_key_pem = None;

        for block in &blocks {
            match block.tag() {
                "CERTIFICATE" if der.is_none() => der = Some(block.contents().to_vec()),
                "PRIVATE KEY" | "RSA PRIVATE KEY" => {
                    private_key_pem = Some(pem::encode(block).into_bytes());
                }
                "ENCRYPTED PRIVATE KEY" => {
                    return Err("Encrypted PEM private keys are not supported, use a PKCS#12 file with CertPass".into());
                }
                _ => {}
            }
        }

        let der = der.ok_or("No CERTIFICATE block found")?;
        let private_key_pem = private_key_pem.ok_or("No PRIVATE KEY block found")?;
        Self::new(der, private_key_pem)
    }

    /// Parse a PKCS#12 (`.pfx`) archive protected by `password`.
    ///
    /// The first certificate bag and the first key bag are used.
    pub fn from_pkcs12(data: &[u8], password: &str) -> std::result::Result<Self, Box<dyn Error>> {
        let pfx = p12::PFX::parse(data).map_err(|e| format!("Invalid PKCS#12 file: {e:?}"))?;
        if !pfx.verify_mac(password) {
            return Err("PKCS#12 integrity check failed, wrong CertPass?".into());
        }
        let der = pfx
            .cert_x509_bags(password)
            .map_err(|e| format!("Cannot read PKCS#12 certificate: {e:?}"))?
            .into_iter()
            .next()
            .ok_or("No certificate found in PKCS#12 file")?;
        let key = pfx
            .key_bags(password)
            .map_err(|e| format!("Cannot read PKCS#12 private key: {e:?}"))?
            .into_iter()
            .next()
            .ok_or("No private key found in PKCS#12 file")?;
        let private_key_pem = pem::encode(&pem::Pem::new("PRIVATE KEY", key)).into_bytes();
        Self::new(der, private_key_pem)
    }

    /// Load a certificate file, PEM when it carries PEM armour and PKCS#12
    /// otherwise. `password` only applies to PKCS#12.
    pub fn from_file(
        path: impl AsRef<Path>,
        password: &str,
    ) -> std::result::Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| format!("Error reading certificate {}: {e}", path.display()))?;
        match std::str::from_utf8(&data) {
            Ok(text) if text.contains("-----BEGIN ") => Self::from_pem(text),
            _ => Self::from_pkcs12(&data, password),
        }
    }

    fn new(der: Vec<u8>, private_key_pem: Vec<u8>) -> std::result::Result<Self, Box<dyn Error>> {
        // Fail early on keys the signer cannot use.
        EncodingKey::from_rsa_pem(&private_key_pem)
            .map_err(|e| format!("Invalid RSA private key: {e}"))?;
        Ok(ClientCertificate {
            der,
            private_key_pem,
        })
    }

    /// Base64url SHA-1 thumbprint of the certificate, the `x5t` header value.
    pub fn thumbprint(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha1::digest(&self.der))
    }

    /// Signed client assertion for `audience` (the token endpoint).
    pub fn client_assertion(&self, client_id: &str, audience: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Claims<'a> {
            aud: &'a str,
            iss: &'a str,
            sub: &'a str,
            jti: String,
            nbf: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            aud: audience,
            iss: client_id,
            sub: client_id,
            jti: uuid::Uuid::new_v4().to_string(),
            nbf: now,
            exp: now + ASSERTION_LIFETIME_MINUTES * 60,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(self.thumbprint());

        let key = EncodingKey::from_rsa_pem(&self.private_key_pem)
            .map_err(|e| ArmError::Auth(format!("invalid private key: {e}")))?;
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| ArmError::Auth(format!("cannot sign client assertion: {e}")))
    }
}

enum ClientAuth {
    Secret(String),
    Certificate(ClientCertificate),
}

impl fmt::Debug for ClientAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientAuth::Secret(_) => f.write_str("Secret(***)"),
            ClientAuth::Certificate(cert) => f.debug_tuple("Certificate").field(cert).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_on - refresh_margin() > Utc::now()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    // v1 endpoints send these as strings, v2 as numbers.
    expires_in: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// A service principal credential with an in-memory token cache.
#[derive(Debug)]
pub struct Credential {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    resource: String,
    auth: ClientAuth,
    cache: Mutex<Option<AccessToken>>,
}

impl Credential {
    pub fn client_secret(
        http: reqwest::Client,
        authority: &str,
        tenant: &str,
        client_id: &str,
        client_secret: &str,
        resource: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            http,
            token_endpoint(authority, tenant)?,
            client_id,
            resource,
            ClientAuth::Secret(client_secret.to_string()),
        ))
    }

    pub fn client_certificate(
        http: reqwest::Client,
        authority: &str,
        tenant: &str,
        client_id: &str,
        certificate: ClientCertificate,
        resource: &str,
    ) -> Result<Self> {
        Ok(Self::new(
            http,
            token_endpoint(authority, tenant)?,
            client_id,
            resource,
            ClientAuth::Certificate(certificate),
        ))
    }

    fn new(
        http: reqwest::Client,
        token_url: Url,
        client_id: &str,
        resource: &str,
        auth: ClientAuth,
    ) -> Self {
        Credential {
            http,
            token_url,
            client_id: client_id.to_string(),
            resource: resource.to_string(),
            auth,
            cache: Mutex::new(None),
        }
    }

    /// Bearer token for the configured resource, from cache when still fresh.
    pub async fn get_token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.token.clone());
        }
        let token = self.request_token().await?;
        let value = token.token.clone();
        *cache = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let assertion;
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("resource", self.resource.as_str()),
        ];
        match &self.auth {
            ClientAuth::Secret(secret) => form.push(("client_secret", secret.as_str())),
            ClientAuth::Certificate(cert) => {
                assertion = cert.client_assertion(&self.client_id, self.token_url.as_str())?;
                form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE));
                form.push(("client_assertion", assertion.as_str()));
            }
        }

        log::debug!("POST {} client_id={}", self.token_url, self.client_id);
        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            let detail = match serde_json::from_slice::<TokenErrorResponse>(&body) {
                Ok(e) => format!("{}: {}", e.error, e.error_description),
                Err(_) => String::from_utf8_lossy(&body).to_string(),
            };
            return Err(ArmError::Auth(format!("{status} {detail}")));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| ArmError::Auth(format!("invalid token response: {e}")))?;
        let expires_in = parsed
            .expires_in
            .as_ref()
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
            .unwrap_or(3600);
        log::debug!("Got token, expires_in={expires_in}s");
        Ok(AccessToken {
            token: parsed.access_token,
            expires_on: Utc::now() + Duration::seconds(expires_in),
        })
    }
}
