//! GitHub REST client and archive fetcher.
//!
//! Covers the three upstream operations the pipeline needs: user
//! lookup, repository listing, and branch-archive download. Archive
//! downloads are cached on disk keyed by `<owner>-<name>.zip`; a cache
//! hit returns immediately without touching the network.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, warn};

use crate::config::GithubConfig;
use crate::types::{PersonaError, RepoRef, RepoSummary, Result, UserProfile};

const USER_AGENT_VALUE: &str = concat!("gitpersona/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    api_base: String,
    download_base: String,
    primary_branch: String,
    fallback_branch: String,
    max_pages: u32,
    archive_dir: PathBuf,
    client: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, archive_dir: PathBuf) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| PersonaError::Config("invalid github token".to_string()))?;
            headers.insert("Authorization", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| PersonaError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            download_base: config.download_base.trim_end_matches('/').to_string(),
            primary_branch: config.primary_branch.clone(),
            fallback_branch: config.fallback_branch.clone(),
            max_pages: config.max_pages,
            archive_dir,
            client,
        })
    }

    /// Fetch user metadata for the persona header.
    pub async fn user_info(&self, login: &str) -> Result<UserProfile> {
        let url = format!("{}/users/{login}", self.api_base);
        debug!("Fetching user info: {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PersonaError::upstream(0, format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersonaError::upstream(
                status.as_u16(),
                format!("user lookup for '{login}' failed: {body}"),
            ));
        }

        Ok(response
            .json()
            .await
            .map_err(|e| PersonaError::upstream(0, format!("invalid user response: {e}")))?)
    }

    /// List a user's public repositories, paginated 100 at a time.
    ///
    /// Stops on the first empty page or at the configured page cap. A
    /// 403 is treated as rate limiting and aborts the listing.
    pub async fn list_repos(&self, login: &str) -> Result<Vec<RepoSummary>> {
        let mut repos = Vec::new();

        for page in 1..=self.max_pages {
            let url = format!(
                "{}/users/{login}/repos?per_page=100&page={page}",
                self.api_base
            );
            debug!("Fetching repo listing page {page}");

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| PersonaError::upstream(0, format!("GitHub request failed: {e}")))?;

            let status = response.status();
            if status == StatusCode::FORBIDDEN {
                return Err(PersonaError::upstream(
                    403,
                    "GitHub rate limit hit; set github.token in the config",
                ));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PersonaError::upstream(
                    status.as_u16(),
                    format!("repo listing for '{login}' failed: {body}"),
                ));
            }

            let page_repos: Vec<RepoSummary> = response
                .json()
                .await
                .map_err(|e| PersonaError::upstream(0, format!("invalid listing response: {e}")))?;

            if page_repos.is_empty() {
                break;
            }
            repos.extend(page_repos);
        }

        info!("Fetched {} repositories for {login}", repos.len());
        Ok(repos)
    }

    /// Download a zip snapshot of the repository's default branch.
    ///
    /// Tries the primary branch name first and retries once with the
    /// fallback on a 404. The archive is written to the cache directory
    /// and the path returned; an existing cached archive short-circuits
    /// the whole operation.
    pub async fn download_archive(&self, repo: &RepoRef) -> Result<PathBuf> {
        let path = self.archive_path(repo);
        if path.exists() {
            debug!("Archive cache hit: {}", path.display());
            return Ok(path);
        }

        let bytes = match self.fetch_zip(repo, &self.primary_branch).await? {
            Some(bytes) => bytes,
            None => {
                debug!(
                    "Branch '{}' not found for {repo}, retrying '{}'",
                    self.primary_branch, self.fallback_branch
                );
                self.fetch_zip(repo, &self.fallback_branch)
                    .await?
                    .ok_or_else(|| {
                        PersonaError::upstream(
                            404,
                            format!(
                                "no '{}' or '{}' branch archive for {repo}",
                                self.primary_branch, self.fallback_branch
                            ),
                        )
                    })?
            }
        };

        std::fs::create_dir_all(&self.archive_dir)?;
        std::fs::write(&path, &bytes)?;
        info!("Downloaded {repo} ({} bytes)", bytes.len());

        Ok(path)
    }

    /// Cache location for a repository archive.
    pub fn archive_path(&self, repo: &RepoRef) -> PathBuf {
        self.archive_dir.join(format!("{}.zip", repo.archive_stem()))
    }

    /// GET one branch archive. `Ok(None)` means the branch does not
    /// exist; any other non-success status is terminal.
    async fn fetch_zip(&self, repo: &RepoRef, branch: &str) -> Result<Option<Vec<u8>>> {
        let url = format!(
            "{}/{}/{}/zip/refs/heads/{branch}",
            self.download_base, repo.owner, repo.name
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PersonaError::upstream(0, format!("archive download failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("Archive download for {repo} returned {status}");
            return Err(PersonaError::upstream(
                status.as_u16(),
                format!("archive download for {repo} failed"),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PersonaError::upstream(0, format!("archive read failed: {e}")))?;

        Ok(Some(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubConfig;

    fn client_with_cache(dir: &std::path::Path) -> GithubClient {
        GithubClient::new(&GithubConfig::default(), dir.to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_cached_archive_skips_network() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with_cache(tmp.path());
        let repo = RepoRef::new("alice", "sample-repo");

        // Pre-seed the cache; a cache hit must return before any
        // network request is attempted.
        let cached = tmp.path().join("alice-sample-repo.zip");
        std::fs::write(&cached, b"not a real zip").unwrap();

        let first = client.download_archive(&repo).await.unwrap();
        let second = client.download_archive(&repo).await.unwrap();
        assert_eq!(first, cached);
        assert_eq!(first, second);
    }

    #[test]
    fn test_archive_path_is_owner_qualified() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with_cache(tmp.path());

        let a = client.archive_path(&RepoRef::new("alice", "tool"));
        let b = client.archive_path(&RepoRef::new("bob", "tool"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = GithubConfig {
            token: Some("bad\ntoken".to_string()),
            ..Default::default()
        };
        assert!(GithubClient::new(&config, PathBuf::from("/tmp")).is_err());
    }
}
