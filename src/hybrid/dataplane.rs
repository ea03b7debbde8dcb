//! Blob service data plane: container creation and block blob upload,
//! authorized with the storage account Shared Key.

use super::Result;
use crate::azure::ArmError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Method;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

pub const STORAGE_SERVICE_VERSION: &str = "2019-02-02";

/// Largest body a single Put Blob accepts at `STORAGE_SERVICE_VERSION`.
pub const MAX_PUT_BLOB_SIZE: u64 = 256 * 1024 * 1024;

/// Standard headers covered by the Shared Key signature, in signing order.
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyCredential {
    /// `key` is the base64 account key as returned by `listKeys`.
    pub fn new(account: &str, key: &str) -> Result<Self> {
        let key = STANDARD
            .decode(key)
            .map_err(|e| format!("cannot create credential for storage account: {e}"))?;
        Ok(SharedKeyCredential {
            account: account.to_string(),
            key,
        })
    }

    /// Canonical string of a request, per the Blob service Shared Key scheme.
    pub fn string_to_sign(&self, method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        };

        let mut lines = vec![method.as_str().to_string()];
        for name in SIGNED_HEADERS {
            let value = match name {
                "content-length" if header(name) == "0" => "",
                _ => header(name),
            };
            lines.push(value.to_string());
        }

        let ms_headers: BTreeMap<String, &str> = headers
            .iter()
            .filter(|(k, _)| k.as_str().starts_with("x-ms-"))
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().trim()))
            .collect();
        for (k, v) in ms_headers {
            lines.push(format!("{k}:{v}"));
        }

        let mut resource = format!("/{}{}", self.account, url.path());
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, v) in url.query_pairs() {
            params
                .entry(k.to_lowercase())
                .or_default()
                .push(v.into_owned());
        }
        for (k, mut values) in params {
            values.sort();
            resource.push_str(&format!("\n{k}:{}", values.join(",")));
        }
        lines.push(resource);
        lines.join("\n")
    }

    /// Base64 HMAC-SHA256 of `string_to_sign` under the account key.
    pub fn sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| format!("invalid storage account key: {e}"))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn authorization(&self, method: &Method, url: &Url, headers: &HeaderMap) -> Result<HeaderValue> {
        let signature = self.sign(&self.string_to_sign(method, url, headers))?;
        Ok(HeaderValue::from_str(&format!(
            "SharedKey {}:{signature}",
            self.account
        ))?)
    }
}

/// A blob container reachable with Shared Key authorization.
#[derive(Debug, Clone)]
pub struct ContainerUrl {
    http: reqwest::Client,
    url: Url,
    credential: SharedKeyCredential,
}

impl ContainerUrl {
    /// `https://{account}.blob.{suffix}/{container}`.
    pub fn new(
        http: reqwest::Client,
        account: &str,
        storage_suffix: &str,
        container: &str,
        key: &str,
    ) -> Result<Self> {
        let base = format!("https://{account}.blob.{storage_suffix}/");
        Self::with_base(http, &base, account, container, key)
    }

    /// Container under an explicit blob service base URL.
    pub fn with_base(
        http: reqwest::Client,
        base: &str,
        account: &str,
        container: &str,
        key: &str,
    ) -> Result<Self> {
        let url = Url::parse(base)
            .and_then(|u| u.join(container))
            .map_err(|e| format!("cannot create container URL: {e}"))?;
        Ok(ContainerUrl {
            http,
            url,
            credential: SharedKeyCredential::new(account, key)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn blob_url(&self, blob: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{blob}", self.url.as_str().trim_end_matches('/')))?)
    }

    async fn send(&self, url: Url, mut headers: HeaderMap, body: Vec<u8>) -> Result<()> {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        headers.insert("x-ms-date", HeaderValue::from_str(&date)?);
        headers.insert(
            "x-ms-version",
            HeaderValue::from_static(STORAGE_SERVICE_VERSION),
        );
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        let auth = self.credential.authorization(&Method::PUT, &url, &headers)?;
        headers.insert(AUTHORIZATION, auth);

        log::debug!("PUT {url}");
        let resp = self
            .http
            .put(url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(ArmError::from_response("PUT", url.as_str(), status, &body).into());
        }
        Ok(())
    }

    pub async fn create_container(&self) -> Result<()> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("restype", "container");
        self.send(url, HeaderMap::new(), vec![])
            .await
            .map_err(|e| format!("cannot create container: {e}"))?;
        log::info!("container {} created", self.url);
        Ok(())
    }

    /// Put `data` as a single block blob named `blob`.
    ///
    /// There is no block list upload, so data over `MAX_PUT_BLOB_SIZE` is
    /// refused without a request.
    pub async fn upload_block_blob(&self, blob: &str, data: Vec<u8>) -> Result<Url> {
        check_put_blob_size(blob, data.len() as u64)?;
        let url = self.blob_url(blob)?;
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-blob-type", HeaderValue::from_static("BlockBlob"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        self.send(url.clone(), headers, data).await?;
        log::info!("uploaded blob {url}");
        Ok(url)
    }

    /// Create the container, then upload the file under its own name.
    ///
    /// The file goes up as one Put Blob, so files over `MAX_PUT_BLOB_SIZE`
    /// fail before the container is created.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<Url> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("cannot read blob file: {}", path.display()))?;
        let size = std::fs::metadata(path)
            .map_err(|e| format!("cannot read blob file {}: {e}", path.display()))?
            .len();
        check_put_blob_size(name, size)?;
        let data = std::fs::read(path)
            .map_err(|e| format!("cannot read blob file {}: {e}", path.display()))?;
        self.create_container().await?;
        self.upload_block_blob(name, data).await
    }
}

fn check_put_blob_size(blob: &str, size: u64) -> Result<()> {
    if size > MAX_PUT_BLOB_SIZE {
        return Err(format!(
            "cannot upload {blob}: {size} bytes is over the single Put Blob limit of {MAX_PUT_BLOB_SIZE} bytes"
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "c2FtcGxlLWFjY291bnQta2V5";

    fn create_container_request() -> (Url, HeaderMap) {
        let url = Url::parse(
            "https://samplestacc.blob.local.azurestack.external/samplecontainer?restype=container",
        )
        .expect("valid url");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ms-date",
            HeaderValue::from_static("Mon, 01 Jan 2024 00:00:00 GMT"),
        );
        headers.insert("x-ms-version", HeaderValue::from_static("2019-02-02"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        (url, headers)
    }

    #[test]
    fn test_string_to_sign() {
        let cred = SharedKeyCredential::new("samplestacc", KEY).expect("valid key");
        let (url, headers) = create_container_request();
        assert_eq!(
            cred.string_to_sign(&Method::PUT, &url, &headers),
            "PUT\n\n\n\n\n\n\n\n\n\n\n\n\
             x-ms-date:Mon, 01 Jan 2024 00:00:00 GMT\n\
             x-ms-version:2019-02-02\n\
             /samplestacc/samplecontainer\n\
             restype:container"
        );
    }

    #[test]
    fn test_sign_known_vector() {
        let cred = SharedKeyCredential::new("samplestacc", KEY).expect("valid key");
        let (url, headers) = create_container_request();
        let signature = cred
            .sign(&cred.string_to_sign(&Method::PUT, &url, &headers))
            .expect("sign");
        assert_eq!(signature, "XmMdSgo/bFRMQ/pHGGpx8r0aof6bzvXl4RYUxihrsfY=");
    }

    #[test]
    fn test_query_params_are_sorted_and_lowercased() {
        let cred = SharedKeyCredential::new("acc", KEY).expect("valid key");
        let url = Url::parse("https://acc.blob.local/c?comp=list&Restype=container")
            .expect("valid url");
        let s = cred.string_to_sign(&Method::GET, &url, &HeaderMap::new());
        assert!(s.ends_with("/acc/c\ncomp:list\nrestype:container"));
    }

    #[test]
    fn test_bad_key_is_rejected() {
        assert!(SharedKeyCredential::new("acc", "not base64!").is_err());
    }

    #[test]
    fn test_container_url() {
        let c = ContainerUrl::new(
            reqwest::Client::new(),
            "samplestacc",
            "local.azurestack.external",
            "samplecontainer",
            KEY,
        )
        .expect("container url");
        assert_eq!(
            c.url().as_str(),
            "https://samplestacc.blob.local.azurestack.external/samplecontainer"
        );
        assert_eq!(
            c.blob_url("test-upload-file.txt").expect("blob url").as_str(),
            "https://samplestacc.blob.local.azurestack.external/samplecontainer/test-upload-file.txt"
        );
    }

    #[tokio::test]
    async fn test_upload_file_over_single_put_limit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("big.vhd");
        let file = std::fs::File::create(&path).expect("create file");
        file.set_len(MAX_PUT_BLOB_SIZE + 1).expect("size file");

        // Nothing listens here; the size check must fail first.
        let c = ContainerUrl::with_base(
            reqwest::Client::new(),
            "http://127.0.0.1:9/",
            "acc",
            "c",
            KEY,
        )
        .expect("container url");
        let err = c.upload_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("single Put Blob limit"), "{err}");
    }
}
