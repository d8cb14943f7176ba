//! GitHub API Client
//!
//! Provides access to the GitHub REST API for release listing, asset listing,
//! and asset downloads. Works anonymously against public repositories; a
//! bearer token unlocks private ones and raises the rate limit.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::errors::GhError;
use super::traits::{Page, ReleaseHost};
use super::types::{AssetInfo, ReleaseInfo, RepoId, RepoInfo};

/// GitHub REST API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The GitHub API requires a User-Agent on every request
const USER_AGENT: &str = concat!("relmount/", env!("CARGO_PKG_VERSION"));

/// GitHub API client bound to a single repository
pub struct GhClient {
    /// HTTP client for making requests
    http: Client,
    /// API base URL
    api_base: String,
    /// Repository this client operates on
    repo: RepoId,
    /// Optional bearer token
    token: Option<String>,
}

impl GhClient {
    /// Connect to the GitHub API for a repository
    ///
    /// Builds the HTTP client and validates the repository coordinate by
    /// fetching its metadata. Fails if the repository does not exist or is
    /// not visible with the given credentials.
    pub async fn connect(repo: RepoId, token: Option<String>) -> Result<Self, GhError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        let client = Self {
            http,
            api_base: GITHUB_API_URL.to_string(),
            repo,
            token,
        };

        let info: RepoInfo = client.get_json(&client.repo_url("")).await?;
        info!(repo = %info.full_name, id = info.id, "GitHub repository resolved");

        Ok(client)
    }

    /// Build a URL under this repository's API prefix
    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_base,
            urlencoding::encode(&self.repo.owner),
            urlencoding::encode(&self.repo.name),
            suffix
        )
    }

    /// Attach the bearer credential if one is configured
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a JSON resource, mapping non-success statuses to errors
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GhError> {
        let response = self
            .authorize(self.http.get(url))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GhError::api(status, body));
        }

        Ok(response.json().await?)
    }

    /// GET one page of a listing endpoint
    ///
    /// The page is last when the response carries no `rel="next"` link.
    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Page<T>, GhError> {
        debug!(url = url, page = page, per_page = per_page, "Listing from GitHub");

        let response = self
            .authorize(self.http.get(url))
            .header("Accept", "application/vnd.github+json")
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GhError::api(status, body));
        }

        let is_last = !has_next_page(response.headers());
        let items: Vec<T> = response.json().await?;

        Ok(Page { items, is_last })
    }
}

#[async_trait]
impl ReleaseHost for GhClient {
    async fn list_releases(&self, page: u32, per_page: u32) -> Result<Page<ReleaseInfo>, GhError> {
        self.get_page(&self.repo_url("/releases"), page, per_page)
            .await
    }

    async fn list_assets(
        &self,
        release_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Page<AssetInfo>, GhError> {
        let url = self.repo_url(&format!("/releases/{}/assets", release_id));
        self.get_page(&url, page, per_page).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, GhError> {
        debug!(url = url, "Downloading asset");

        // The octet-stream Accept header makes GitHub redirect to the
        // content host; reqwest follows the redirect and drops the
        // Authorization header across origins.
        let response = self
            .authorize(self.http.get(url))
            .header("Accept", "application/octet-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GhError::api(status, body));
        }

        let bytes = response.bytes().await?;
        info!(url = url, size = bytes.len(), "Downloaded asset");
        Ok(bytes.to_vec())
    }
}

/// Whether a listing response advertises a further page
///
/// GitHub paginates via the `Link` header:
/// `<https://...&page=2>; rel="next", <https://...&page=9>; rel="last"`.
fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .map(|link| {
            link.split(',')
                .any(|part| part.contains("rel=\"next\""))
        })
        .unwrap_or(false)
}
