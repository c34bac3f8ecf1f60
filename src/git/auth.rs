//! Git authentication configuration.

use url::Url;

/// Authentication method for git remote operations.
#[derive(Clone, Default)]
pub enum GitAuth {
    /// Token-based authentication (for HTTPS).
    Token(String),
    /// Use system credential helper.
    CredentialHelper,
    /// No authentication (public repos and local paths only).
    #[default]
    None,
}

impl GitAuth {
    /// Create token-based auth (typically for GitHub HTTPS URLs).
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// The token, when token auth is configured.
    pub fn token_value(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Replace every occurrence of the token in a message.
    pub fn scrub(&self, message: &str) -> String {
        match self.token_value() {
            Some(token) if !token.is_empty() => message.replace(token, "***"),
            _ => message.to_string(),
        }
    }
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => write!(f, "Token(***)"),
            Self::CredentialHelper => write!(f, "CredentialHelper"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Embed a token in an HTTPS URL as its userinfo prefix.
///
/// `https://github.com/acme/r1.git` becomes `https://TOKEN@github.com/acme/r1.git`.
/// Other schemes and local paths are returned unchanged.
pub fn authenticated_url(url: &str, token: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.scheme() == "https" => {
            if parsed.set_username(token).is_ok() {
                parsed.to_string()
            } else {
                url.to_string()
            }
        }
        _ => url.to_string(),
    }
}

/// Mask any userinfo in a URL so it can be logged.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            let _ = parsed.set_password(None);
            let _ = parsed.set_username("***");
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
