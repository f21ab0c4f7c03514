//! Azure Storage connection string parsing.
//!
//! Supports account key strings (`AccountName=..;AccountKey=..`), explicit
//! endpoints (`BlobEndpoint=..`), SAS strings (`SharedAccessSignature=..`)
//! and the Azurite shortcut `UseDevelopmentStorage=true`.

use base64::{Engine as _, engine::general_purpose};
use std::{collections::HashMap, fmt};
use thiserror::Error;

use crate::store::shared_key::SharedKeyCredential;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("segment `{0}` is not a key=value pair")]
    MalformedSegment(String),
    #[error("missing `{0}`")]
    Missing(&'static str),
    #[error("AccountKey is not valid base64")]
    InvalidAccountKey,
    #[error("either AccountKey or SharedAccessSignature is required")]
    NoCredential,
}

/// How requests to the blob endpoint are authorized.
#[derive(Clone)]
pub enum Credential {
    SharedKey(SharedKeyCredential),
    /// SAS token, stored without a leading `?`.
    Sas(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::SharedKey(key) => f
                .debug_tuple("SharedKey")
                .field(&key.account())
                .finish(),
            Credential::Sas(_) => f.write_str("Sas(<redacted>)"),
        }
    }
}

/// The parts of a connection string the blob client needs.
#[derive(Clone, Debug)]
pub struct StorageConnection {
    /// Blob service endpoint without a trailing slash.
    pub blob_endpoint: String,
    pub credential: Credential,
}

impl StorageConnection {
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let mut fields = HashMap::new();
        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(segment.to_string()))?;
            fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        if fields
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Self::development();
        }

        let account = fields.get("accountname").cloned();
        let blob_endpoint = match fields.get("blobendpoint") {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let account = account
                    .as_deref()
                    .ok_or(ConnectionStringError::Missing("AccountName"))?;
                let protocol = fields
                    .get("defaultendpointsprotocol")
                    .map(String::as_str)
                    .unwrap_or("https");
                let suffix = fields
                    .get("endpointsuffix")
                    .map(String::as_str)
                    .unwrap_or("core.windows.net");
                format!("{protocol}://{account}.blob.{suffix}")
            }
        };

        let credential = if let Some(key) = fields.get("accountkey") {
            let account = account.ok_or(ConnectionStringError::Missing("AccountName"))?;
            Credential::SharedKey(shared_key(account, key)?)
        } else if let Some(sas) = fields.get("sharedaccesssignature") {
            Credential::Sas(sas.trim_start_matches('?').to_string())
        } else {
            return Err(ConnectionStringError::NoCredential);
        };

        Ok(Self {
            blob_endpoint,
            credential,
        })
    }

    /// Azurite's well-known local account.
    fn development() -> Result<Self, ConnectionStringError> {
        Ok(Self {
            blob_endpoint: DEV_BLOB_ENDPOINT.to_string(),
            credential: Credential::SharedKey(shared_key(
                DEV_ACCOUNT_NAME.to_string(),
                DEV_ACCOUNT_KEY,
            )?),
        })
    }
}

fn shared_key(account: String, key: &str) -> Result<SharedKeyCredential, ConnectionStringError> {
    let decoded = general_purpose::STANDARD
        .decode(key)
        .map_err(|_| ConnectionStringError::InvalidAccountKey)?;
    Ok(SharedKeyCredential::new(account, decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_string_builds_default_endpoint() {
        let conn = StorageConnection::parse(
            "DefaultEndpointsProtocol=https;AccountName=photos;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        assert_eq!(conn.blob_endpoint, "https://photos.blob.core.windows.net");
        match conn.credential {
            Credential::SharedKey(key) => assert_eq!(key.account(), "photos"),
            other => panic!("unexpected credential {:?}", other),
        }
    }

    #[test]
    fn explicit_blob_endpoint_wins_and_loses_trailing_slash() {
        let conn = StorageConnection::parse(
            "BlobEndpoint=https://cdn.example.com/;SharedAccessSignature=?sv=2021&sig=abc%3D",
        )
        .unwrap();

        assert_eq!(conn.blob_endpoint, "https://cdn.example.com");
        match conn.credential {
            Credential::Sas(token) => assert_eq!(token, "sv=2021&sig=abc%3D"),
            other => panic!("unexpected credential {:?}", other),
        }
    }

    #[test]
    fn development_storage_points_at_azurite() {
        let conn = StorageConnection::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(conn.blob_endpoint, "http://127.0.0.1:10000/devstoreaccount1");
        assert!(matches!(conn.credential, Credential::SharedKey(_)));
    }

    #[test]
    fn rejects_incomplete_strings() {
        assert_eq!(
            StorageConnection::parse("AccountKey=c2VjcmV0").unwrap_err(),
            ConnectionStringError::Missing("AccountName")
        );
        assert_eq!(
            StorageConnection::parse("AccountName=photos").unwrap_err(),
            ConnectionStringError::NoCredential
        );
        assert_eq!(
            StorageConnection::parse("AccountName=photos;garbage").unwrap_err(),
            ConnectionStringError::MalformedSegment("garbage".into())
        );
        assert_eq!(
            StorageConnection::parse("AccountName=photos;AccountKey=%%%").unwrap_err(),
            ConnectionStringError::InvalidAccountKey
        );
    }

    #[test]
    fn debug_output_hides_secrets() {
        let conn = StorageConnection::parse(
            "BlobEndpoint=https://cdn.example.com;SharedAccessSignature=sv=2021&sig=topsecret",
        )
        .unwrap();
        let printed = format!("{:?}", conn);
        assert!(!printed.contains("topsecret"));
    }
}
