//! Run configuration resolved from command-line flags and the environment.

use crate::error::{BackupError, Result};
use std::path::PathBuf;

pub const ORG_ENV: &str = "GITHUB_ORG";
pub const TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";
pub const BACKUP_DIR_ENV: &str = "GITHUB_BACKUP_DIR";
pub const API_URL_ENV: &str = "GITHUB_API_URL";
pub const STORAGE_ACCOUNT_ENV: &str = "AZURE_STORAGE_ACCOUNT";
pub const STORAGE_CONTAINER_ENV: &str = "AZURE_STORAGE_CONTAINER";
pub const STORAGE_SAS_TOKEN_ENV: &str = "AZURE_STORAGE_SAS_TOKEN";

/// Organization, token, and output folder of a backup run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub organization: String,
    pub token: String,
    pub output_dir: PathBuf,
}

impl Credentials {
    /// Build credentials from optional inputs.
    ///
    /// Empty values count as missing. The error lists every missing item.
    pub fn resolve(
        organization: Option<String>,
        token: Option<String>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let organization = non_empty(organization);
        let token = non_empty(token);
        let output_dir = output_dir.filter(|dir| !dir.as_os_str().is_empty());

        let mut missing = Vec::new();
        if organization.is_none() {
            missing.push(format!("organization ({})", ORG_ENV));
        }
        if token.is_none() {
            missing.push(format!("access token ({})", TOKEN_ENV));
        }
        if output_dir.is_none() {
            missing.push(format!("backup directory ({})", BACKUP_DIR_ENV));
        }

        match (organization, token, output_dir) {
            (Some(organization), Some(token), Some(output_dir)) => Ok(Self {
                organization,
                token,
                output_dir,
            }),
            _ => Err(BackupError::InvalidConfig(format!(
                "missing {}",
                missing.join(", ")
            ))),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("organization", &self.organization)
            .field("token", &"***")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Azure Blob Storage target for published artifacts.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishSettings {
    pub account: String,
    pub container: String,
    pub sas_token: String,
}

impl PublishSettings {
    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| non_empty(lookup(name));
        let account = read(STORAGE_ACCOUNT_ENV);
        let container = read(STORAGE_CONTAINER_ENV);
        let sas_token = read(STORAGE_SAS_TOKEN_ENV);

        match (account, container, sas_token) {
            (Some(account), Some(container), Some(sas_token)) => Ok(Self {
                account,
                container,
                sas_token,
            }),
            (account, container, sas_token) => {
                let missing: Vec<&str> = [
                    (account.is_none(), STORAGE_ACCOUNT_ENV),
                    (container.is_none(), STORAGE_CONTAINER_ENV),
                    (sas_token.is_none(), STORAGE_SAS_TOKEN_ENV),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(BackupError::InvalidConfig(format!(
                    "publishing requires {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

impl std::fmt::Debug for PublishSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishSettings")
            .field("account", &self.account)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
