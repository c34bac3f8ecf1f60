//! GitHub API client.

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::error::{BackupError, Result};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 1000;

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) token: String,
    pub(crate) base_url: String,
    pub(crate) client: Client,
    max_pages: usize,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: Client::new(),
            max_pages: MAX_PAGES,
        }
    }

    /// Create a client for GitHub Enterprise with a custom base URL.
    pub fn with_enterprise(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if url.ends_with('/') {
            url.pop();
        }
        Self {
            token: token.into(),
            base_url: url,
            client: Client::new(),
            max_pages: MAX_PAGES,
        }
    }

    /// Limit how many pages a listing may span before it is reported as an error.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| BackupError::InvalidConfig("access token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("org-backup"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Make a GET request to the GitHub API.
    pub(crate) fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.execute(self.client.get(&url), endpoint)
    }

    /// GET every page of a list endpoint, in the order the API returns them.
    ///
    /// A listing that is still going after `max_pages` full pages is an error
    /// rather than a truncated result.
    pub(crate) fn get_paginated<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let paged = format!("{}{}per_page={}&page={}", endpoint, separator, PER_PAGE, page);
            let batch: Vec<T> = self.get(&paged)?;

            if page > self.max_pages {
                if batch.is_empty() {
                    return Ok(items);
                }
                return Err(BackupError::GitHub {
                    message: format!(
                        "{} spans more than {} pages of {} items",
                        endpoint, self.max_pages, PER_PAGE
                    ),
                });
            }

            let last = batch.len() < PER_PAGE;
            items.extend(batch);
            if last {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Make a POST request to the GitHub API.
    pub(crate) fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.execute(self.client.post(&url).json(body), endpoint)
    }

    /// Make a PATCH request to the GitHub API.
    pub(crate) fn patch<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.execute(self.client.patch(&url).json(body), endpoint)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T> {
        let response = request.headers(self.headers()?).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(BackupError::NotFound(endpoint.to_string()));
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackupError::GitHub {
                message: format!("API request failed ({}): {}", status, body),
            });
        }

        response.json().map_err(|e| BackupError::GitHub {
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
