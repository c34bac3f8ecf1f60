//! Git push operations with authentication.

use crate::error::{BackupError, Result};
use crate::git::{GitAuth, GitOps};
use git2::{Cred, PushOptions, RemoteCallbacks};

/// Push operations for GitOps.
pub trait PushOps {
    /// Add a named remote.
    fn add_remote(&self, remote_name: &str, url: &str) -> Result<()>;

    /// Push a branch to a remote.
    fn push(&self, remote_name: &str, branch: &str) -> Result<()>;
}

impl PushOps for GitOps {
    fn add_remote(&self, remote_name: &str, url: &str) -> Result<()> {
        self.repo.remote(remote_name, url)?;
        Ok(())
    }

    fn push(&self, remote_name: &str, branch: &str) -> Result<()> {
        let mut remote =
            self.repo
                .find_remote(remote_name)
                .map_err(|_| BackupError::PushError {
                    message: format!("Remote '{}' not found", remote_name),
                })?;

        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);

        // libgit2 reports refs the server declined through a callback, not as an error
        let mut rejection: Option<String> = None;
        {
            let mut callbacks = remote_callbacks(&self.auth);
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejection = Some(format!("{} rejected: {}", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&[&refspec], Some(&mut push_options))
                .map_err(|e| BackupError::PushError {
                    message: self.auth.scrub(&format!("Push failed: {}", e)),
                })?;
        }

        if let Some(message) = rejection {
            return Err(BackupError::PushError { message });
        }

        Ok(())
    }
}

/// Credential callbacks for fetch, clone, and push.
pub(crate) fn remote_callbacks<'a>(auth: &GitAuth) -> RemoteCallbacks<'a> {
    let auth = auth.clone();
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |url, username_from_url, allowed_types| match &auth {
        // GitHub accepts the token as the username over HTTPS
        GitAuth::Token(token) => Cred::userpass_plaintext(token, ""),
        GitAuth::CredentialHelper => {
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                Cred::credential_helper(&git2::Config::open_default()?, url, username_from_url)
            } else if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
            } else {
                Cred::default()
            }
        }
        GitAuth::None => {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
            } else {
                Cred::default()
            }
        }
    });

    callbacks
}
