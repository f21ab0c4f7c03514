//! Shared Key authorization for the Blob service.
//!
//! The signature is an HMAC-SHA256, keyed with the decoded account key, over a
//! canonical rendering of the request: verb, the standard headers, every
//! `x-ms-*` header and the resource path with its query parameters.
//! See <https://learn.microsoft.com/rest/api/storageservices/authorize-with-shared-key>.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use reqwest::{Request, Url, header::HeaderMap, header::HeaderValue};
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::store::{StoreError, StoreResult};

type HmacSha256 = Hmac<Sha256>;

/// Standard headers that take part in the string to sign, in order.
/// `Content-Length` is rendered separately from the request body.
const SIGNED_HEADERS_BEFORE_LENGTH: [&str; 2] = ["content-encoding", "content-language"];
const SIGNED_HEADERS_AFTER_LENGTH: [&str; 8] = [
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

impl SharedKeyCredential {
    /// `key` is the already base64-decoded account key.
    pub fn new(account: String, key: Vec<u8>) -> Self {
        Self { account, key }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Build the `Authorization` header value for a fully built request.
    ///
    /// Must run after every `x-ms-*` header has been set.
    pub fn authorization(&self, request: &Request) -> StoreResult<HeaderValue> {
        let payload = string_to_sign(&self.account, request);
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|err| StoreError::Credential(err.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        HeaderValue::from_str(&format!("SharedKey {}:{}", self.account, signature))
            .map_err(|err| StoreError::Credential(err.to_string()))
    }
}

pub(crate) fn string_to_sign(account: &str, request: &Request) -> String {
    let headers = request.headers();

    // A zero length is signed as an empty string.
    let content_length = match request.body().and_then(|b| b.as_bytes()).map(<[u8]>::len) {
        Some(0) | None => String::new(),
        Some(len) => len.to_string(),
    };

    let mut lines = vec![request.method().as_str().to_string()];
    lines.extend(
        SIGNED_HEADERS_BEFORE_LENGTH
            .iter()
            .map(|h| header_value(headers, h).to_string()),
    );
    lines.push(content_length);
    lines.extend(
        SIGNED_HEADERS_AFTER_LENGTH
            .iter()
            .map(|h| header_value(headers, h).to_string()),
    );

    let mut payload = lines.join("\n");
    payload.push('\n');
    payload.push_str(&canonicalized_headers(headers));
    payload.push_str(&canonicalized_resource(account, request.url()));
    payload
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        if name.as_str().starts_with("x-ms-") {
            ms_headers
                .entry(name.as_str())
                .or_default()
                .push(value.to_str().unwrap_or("").trim());
        }
    }

    ms_headers
        .into_iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

fn canonicalized_resource(account: &str, url: &Url) -> String {
    let mut resource = format!("/{}{}", account, url.path());

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }
    for (key, mut values) in params {
        values.sort();
        resource.push_str(&format!("\n{}:{}", key, values.join(",")));
    }

    resource
}
