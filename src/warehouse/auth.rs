//! Bearer credentials for the warehouse REST API.

use reqwest::Client;
use serde::Deserialize;

use super::WarehouseError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the client gets its OAuth access token
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A token supplied up front (config file or `GOOGLE_OAUTH_ACCESS_TOKEN`)
    Static(String),
    /// The GCE/GKE metadata server of the host the process runs on
    MetadataServer { url: String },
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    /// Static token when one is configured, metadata server otherwise
    pub fn from_config(access_token: Option<&str>) -> Self {
        match access_token {
            Some(token) if !token.is_empty() => TokenSource::Static(token.to_string()),
            _ => TokenSource::metadata_server(),
        }
    }

    pub fn metadata_server() -> Self {
        TokenSource::MetadataServer {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }

    /// Resolve a bearer token. The metadata server is asked on every call.
    pub async fn token(&self, client: &Client) -> Result<String, WarehouseError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer { url } => {
                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| {
                        WarehouseError::Credentials(format!("metadata server unreachable: {}", e))
                    })?;

                if !response.status().is_success() {
                    return Err(WarehouseError::Credentials(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }

                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| WarehouseError::Credentials(e.to_string()))?;
                Ok(token.access_token)
            }
        }
    }
}
