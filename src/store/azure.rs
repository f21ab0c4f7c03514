//! Azure Blob Storage client over the REST API.
//!
//! Each call is a single request (listing follows `NextMarker` pages). Failures
//! are returned as-is; retries and timeouts are whatever `reqwest` defaults to.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::Utc;
use reqwest::{
    Client, Method, RequestBuilder, Response, Url,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{BlobStore, Credential, StorageConnection, StoreError, StoreResult};

/// REST API version sent with every request.
pub const API_VERSION: &str = "2021-08-06";

#[derive(Clone)]
pub struct AzureBlobStore {
    client: Client,
    connection: StorageConnection,
    container: String,
}

impl AzureBlobStore {
    pub fn new(connection: StorageConnection, container: impl Into<String>) -> StoreResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, connection, container))
    }

    pub fn with_client(
        client: Client,
        connection: StorageConnection,
        container: impl Into<String>,
    ) -> Self {
        Self {
            client,
            connection,
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn container_url(&self) -> StoreResult<Url> {
        let raw = format!("{}/{}", self.connection.blob_endpoint, self.container);
        Url::parse(&raw).map_err(|err| StoreError::InvalidUrl(format!("{}: {}", raw, err)))
    }

    fn blob_url(&self, name: &str) -> StoreResult<Url> {
        let mut url = self.container_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.connection.blob_endpoint.clone()))?
            .push(name);
        Ok(url)
    }

    /// Start a request, appending the SAS token when that is the credential.
    fn request(&self, method: Method, mut url: Url) -> RequestBuilder {
        if let Credential::Sas(token) = &self.connection.credential {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, token),
                _ => token.clone(),
            };
            url.set_query(Some(&query));
        }
        self.client.request(method, url)
    }

    /// Stamp the service headers, sign, send, and turn non-2xx into errors.
    async fn send(&self, builder: RequestBuilder) -> StoreResult<Response> {
        let mut request = builder
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", http_date())
            .header("x-ms-client-request-id", Uuid::new_v4().to_string())
            .build()?;

        if let Credential::SharedKey(key) = &self.connection.credential {
            let authorization = key.authorization(&request)?;
            request.headers_mut().insert(AUTHORIZATION, authorization);
        }

        debug!("{} {}", request.method(), request.url().path());
        let response = self.client.execute(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(service_error(response).await)
        }
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn ensure_container(&self) -> StoreResult<()> {
        let mut url = self.container_url()?;
        url.query_pairs_mut().append_pair("restype", "container");

        let builder = self
            .request(Method::PUT, url)
            .header("x-ms-blob-public-access", "container")
            .body(Bytes::new());

        match self.send(builder).await {
            Ok(_) => {
                info!("created container {}", self.container);
                Ok(())
            }
            Err(StoreError::Service { status: 409, code, .. })
                if code == "ContainerAlreadyExists" =>
            {
                debug!("container {} already exists", self.container);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn put_blob(&self, name: &str, content_type: &str, data: Bytes) -> StoreResult<()> {
        let digest = md5::compute(&data);
        let builder = self
            .request(Method::PUT, self.blob_url(name)?)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, content_type)
            .header("content-md5", general_purpose::STANDARD.encode(digest.0))
            .body(data);

        self.send(builder).await?;
        Ok(())
    }

    async fn list_blob_names(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut url = self.container_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("restype", "container");
                query.append_pair("comp", "list");
                if let Some(marker) = &marker {
                    query.append_pair("marker", marker);
                }
            }

            let body = self
                .send(self.request(Method::GET, url))
                .await?
                .text()
                .await?;
            let page = parse_listing(&body)?;
            names.extend(page.blobs.blob.into_iter().map(|b| b.name));

            match page.next_marker.filter(|m| !m.is_empty()) {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        debug!("listed {} blobs in {}", names.len(), self.container);
        Ok(names)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    blobs: BlobList,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BlobList {
    #[serde(rename = "Blob", default)]
    blob: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
struct BlobItem {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn parse_listing(body: &str) -> StoreResult<EnumerationResults> {
    quick_xml::de::from_str(body.trim_start_matches('\u{feff}'))
        .map_err(|err| StoreError::Decode(err.to_string()))
}

async fn service_error(response: Response) -> StoreError {
    let status = response.status();
    let header_code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody =
        quick_xml::de::from_str(body.trim_start_matches('\u{feff}')).unwrap_or_default();

    let code = header_code
        .or(parsed.code)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = parsed
        .message
        .map(|m| m.lines().next().unwrap_or_default().to_string())
        .unwrap_or_else(|| status.to_string());

    StoreError::Service {
        status: status.as_u16(),
        code,
        message,
    }
}

/// RFC 1123 date in GMT, the format `x-ms-date` expects.
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
