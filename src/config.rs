use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt};

use crate::store::StorageConnection;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub container: String,
    /// Parsed `AZURE_STORAGE_CONNECTION_STRING`.
    pub connection: StorageConnection,
    /// Public base URL of the storage account, without a trailing slash.
    pub public_base_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Image upload and gallery service")]
pub struct Args {
    /// Host to bind to (overrides GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Blob container holding the images (overrides IMAGES_CONTAINER)
    #[arg(long)]
    pub container: Option<String>,

    /// Storage connection string (overrides AZURE_STORAGE_CONNECTION_STRING)
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Public base URL used in image links (overrides STORAGE_ACCOUNT_URL)
    #[arg(long)]
    pub storage_account_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed args over values looked up with `vars`.
    pub fn from_args(args: Args, vars: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| vars(name).filter(|v| !v.trim().is_empty());

        let host = args
            .host
            .or_else(|| non_empty("GALLERY_HOST"))
            .unwrap_or_else(|| "0.0.0.0".into());
        let port = match (args.port, non_empty("GALLERY_PORT")) {
            (Some(port), _) => port,
            (None, Some(value)) => value
                .parse::<u16>()
                .with_context(|| format!("parsing GALLERY_PORT value `{}`", value))?,
            (None, None) => 5000,
        };

        let Some(container) = args.container.or_else(|| non_empty("IMAGES_CONTAINER")) else {
            bail!("IMAGES_CONTAINER is not set");
        };
        let Some(raw_connection) = args
            .connection_string
            .or_else(|| non_empty("AZURE_STORAGE_CONNECTION_STRING"))
        else {
            bail!("AZURE_STORAGE_CONNECTION_STRING is not set");
        };
        let connection = StorageConnection::parse(&raw_connection)
            .context("parsing AZURE_STORAGE_CONNECTION_STRING")?;

        let public_base_url = match args
            .storage_account_url
            .or_else(|| non_empty("STORAGE_ACCOUNT_URL"))
        {
            Some(url) => url,
            None => {
                tracing::info!(
                    "STORAGE_ACCOUNT_URL not set, using blob endpoint {}",
                    connection.blob_endpoint
                );
                connection.blob_endpoint.clone()
            }
        };

        Ok(Self {
            host,
            port,
            container,
            connection,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("container", &self.container)
            .field("blob_endpoint", &self.connection.blob_endpoint)
            .field("credential", &self.connection.credential)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONN: &str = "AccountName=photos;AccountKey=c2VjcmV0";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_supplies_everything() {
        let cfg = AppConfig::from_args(
            Args::default(),
            lookup(&[
                ("IMAGES_CONTAINER", "images"),
                ("AZURE_STORAGE_CONNECTION_STRING", CONN),
                ("STORAGE_ACCOUNT_URL", "https://cdn.example.com/"),
                ("GALLERY_PORT", "8080"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.container, "images");
        assert_eq!(cfg.public_base_url, "https://cdn.example.com");
    }

    #[test]
    fn args_override_env() {
        let args = Args {
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            container: Some("from-args".into()),
            ..Args::default()
        };
        let cfg = AppConfig::from_args(
            args,
            lookup(&[
                ("IMAGES_CONTAINER", "from-env"),
                ("AZURE_STORAGE_CONNECTION_STRING", CONN),
                ("GALLERY_PORT", "not-a-port"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.container, "from-args");
    }

    #[test]
    fn public_url_falls_back_to_blob_endpoint() {
        let cfg = AppConfig::from_args(
            Args::default(),
            lookup(&[
                ("IMAGES_CONTAINER", "images"),
                ("AZURE_STORAGE_CONNECTION_STRING", CONN),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.public_base_url, "https://photos.blob.core.windows.net");
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn missing_required_values_fail_fast() {
        let err = AppConfig::from_args(
            Args::default(),
            lookup(&[("AZURE_STORAGE_CONNECTION_STRING", CONN)]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("IMAGES_CONTAINER"));

        let err = AppConfig::from_args(Args::default(), lookup(&[("IMAGES_CONTAINER", "images")]))
            .unwrap_err();
        assert!(err.to_string().contains("AZURE_STORAGE_CONNECTION_STRING"));

        let err = AppConfig::from_args(
            Args::default(),
            lookup(&[
                ("IMAGES_CONTAINER", "images"),
                ("AZURE_STORAGE_CONNECTION_STRING", "AccountName=photos"),
            ]),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("AccountKey or SharedAccessSignature"));
    }

    #[test]
    fn debug_does_not_leak_the_key() {
        let cfg = AppConfig::from_args(
            Args::default(),
            lookup(&[
                ("IMAGES_CONTAINER", "images"),
                ("AZURE_STORAGE_CONNECTION_STRING", CONN),
            ]),
        )
        .unwrap();

        assert!(!format!("{:?}", cfg).contains("c2VjcmV0"));
    }
}
