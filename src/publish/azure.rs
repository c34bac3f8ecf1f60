//! Azure Blob Storage publisher authenticated with a SAS token.

use crate::error::{BackupError, Result};
use crate::publish::BlobPublisher;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use tracing::info;

const STORAGE_API_VERSION: &str = "2021-08-06";

/// Uploads artifacts as block blobs into one container.
#[derive(Clone)]
pub struct AzureBlobPublisher {
    endpoint: String,
    container: String,
    sas_token: String,
    client: Client,
}

impl AzureBlobPublisher {
    /// Create a publisher for `https://{account}.blob.core.windows.net/{container}`.
    pub fn new(
        account: impl AsRef<str>,
        container: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        Self::with_endpoint(
            format!("https://{}.blob.core.windows.net", account.as_ref()),
            container,
            sas_token,
        )
    }

    /// Create a publisher against a custom endpoint, e.g. a storage emulator.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        container: impl Into<String>,
        sas_token: impl Into<String>,
    ) -> Self {
        let mut endpoint = endpoint.into();
        if endpoint.ends_with('/') {
            endpoint.pop();
        }
        let sas_token: String = sas_token.into();
        Self {
            endpoint,
            container: container.into(),
            sas_token: sas_token.trim_start_matches('?').to_string(),
            client: Client::new(),
        }
    }

    /// Blob URL without the SAS query, safe to log.
    pub fn blob_url(&self, blob_name: &str) -> String {
        let encoded: Vec<String> = blob_name
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}/{}", self.endpoint, self.container, encoded.join("/"))
    }
}

impl BlobPublisher for AzureBlobPublisher {
    fn upload(&self, artifact: &Path, blob_name: &str) -> Result<()> {
        let body = fs::read(artifact)?;
        let size = body.len();
        let url = self.blob_url(blob_name);

        let response = self
            .client
            .put(format!("{}?{}", url, self.sas_token))
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", STORAGE_API_VERSION)
            .body(body)
            .send()
            .map_err(|e| BackupError::Publish {
                artifact: artifact.to_path_buf(),
                // The request URL carries the SAS token
                message: format!("upload to {} failed: {}", url, e.without_url()),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(BackupError::Publish {
                artifact: artifact.to_path_buf(),
                message: format!("upload to {} failed ({}): {}", url, status, text),
            });
        }

        info!(blob = %url, bytes = size, "Artifact uploaded");
        Ok(())
    }
}

impl std::fmt::Debug for AzureBlobPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobPublisher")
            .field("endpoint", &self.endpoint)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}
