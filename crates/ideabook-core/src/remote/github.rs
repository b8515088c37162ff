//! GitHub contents API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{RemoteError, RemoteFile, RemoteResult, RemoteStore, RemoteUser};
use crate::config::SyncConfig;
use crate::util::{error_excerpt, has_http_scheme, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const GITHUB_API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("ideabook/", env!("CARGO_PKG_VERSION"));

/// Transport settings for [`GitHubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubClientOptions {
    /// API root, e.g. `https://api.github.com` or a GitHub Enterprise
    /// `https://host/api/v3`.
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for GitHubClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// [`RemoteStore`] backed by one GitHub repository.
#[derive(Clone)]
pub struct GitHubClient {
    base_url: String,
    owner: String,
    repo: String,
    credential: String,
    client: Client,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("credential", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(config: &SyncConfig, options: &GitHubClientOptions) -> RemoteResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(&options.base_url)?,
            owner: config.owner().to_string(),
            repo: config.repo().to_string(),
            credential: config.credential().to_string(),
            client: build_http_client(options)?,
        })
    }

    /// Identity behind `credential`, checked before any repository is
    /// configured.
    pub async fn verify_credential(
        credential: &str,
        options: &GitHubClientOptions,
    ) -> RemoteResult<RemoteUser> {
        let credential = normalize_text_option(Some(credential.to_string())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("Credential must not be empty".to_string())
        })?;
        let base_url = normalize_base_url(&options.base_url)?;
        let client = build_http_client(options)?;
        fetch_user(&client, &base_url, &credential).await
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn repository_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repository_url(), encode_path(path))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        github_request(&self.client, method, url, &self.credential)
    }

    /// Raw contents entry for `path`; `None` for a missing path or a
    /// directory.
    async fn get_contents(&self, path: &str) -> RemoteResult<Option<FileContents>> {
        tracing::debug!("GET contents {}/{}:{}", self.owner, self.repo, path);
        let response = self
            .request(Method::GET, &self.contents_url(path))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        match response.json::<ContentsPayload>().await? {
            ContentsPayload::File(file) => Ok(Some(file)),
            ContentsPayload::Listing(_) => {
                tracing::warn!("Remote path {} is a directory, not a document", path);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl RemoteStore for GitHubClient {
    async fn get_file(&self, path: &str) -> RemoteResult<Option<RemoteFile>> {
        self.get_contents(path)
            .await?
            .map(|file| file.into_remote_file(path))
            .transpose()
    }

    async fn get_file_sha(&self, path: &str) -> RemoteResult<Option<String>> {
        Ok(self.get_contents(path).await?.map(|file| file.sha))
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> RemoteResult<String> {
        tracing::debug!(
            "PUT contents {}/{}:{} (sha: {})",
            self.owner,
            self.repo,
            path,
            sha.unwrap_or("new file")
        );
        let payload = PutContentsRequest {
            message,
            content: encode_transport(content),
            sha,
        };
        let response = self
            .request(Method::PUT, &self.contents_url(path))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(put_error(status, &body, path));
        }

        let committed = response.json::<PutContentsResponse>().await?;
        committed
            .content
            .map(|content| content.sha)
            .filter(|sha| !sha.trim().is_empty())
            .ok_or_else(|| {
                RemoteError::InvalidPayload(format!(
                    "write response for {path} did not include a content sha"
                ))
            })
    }

    async fn repository_exists(&self) -> bool {
        match self
            .request(Method::GET, &self.repository_url())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    "Repository {}/{} is not accessible (HTTP {})",
                    self.owner,
                    self.repo,
                    response.status().as_u16()
                );
                false
            }
            Err(error) => {
                tracing::warn!(
                    "Repository probe for {}/{} failed: {}",
                    self.owner,
                    self.repo,
                    error
                );
                false
            }
        }
    }

    async fn authenticated_user(&self) -> RemoteResult<RemoteUser> {
        fetch_user(&self.client, &self.base_url, &self.credential).await
    }
}

fn build_http_client(options: &GitHubClientOptions) -> RemoteResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(options.request_timeout)
        .build()?)
}

fn github_request(client: &Client, method: Method, url: &str, credential: &str) -> RequestBuilder {
    client
        .request(method, url)
        .bearer_auth(credential)
        .header(ACCEPT, GITHUB_MEDIA_TYPE)
        .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION)
}

async fn fetch_user(client: &Client, base_url: &str, credential: &str) -> RemoteResult<RemoteUser> {
    let response = github_request(client, Method::GET, &format!("{base_url}/user"), credential)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(status, &body));
    }
    Ok(response.json::<RemoteUser>().await?)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsPayload {
    File(FileContents),
    Listing(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct FileContents {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl FileContents {
    fn into_remote_file(self, path: &str) -> RemoteResult<RemoteFile> {
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                return Err(RemoteError::InvalidPayload(format!(
                    "{path} is served with unsupported encoding '{encoding}'"
                )));
            }
        }

        let content = decode_transport(self.content.as_deref().unwrap_or_default())?;
        Ok(RemoteFile {
            content,
            sha: self.sha,
        })
    }
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: Option<CommittedContent>,
}

#[derive(Debug, Deserialize)]
struct CommittedContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

/// Base64 transport form of a document.
pub(crate) fn encode_transport(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Decode a base64 payload. GitHub wraps it at 60 columns, so whitespace is
/// ignored.
pub(crate) fn decode_transport(payload: &str) -> RemoteResult<String> {
    let compact = payload
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect::<String>();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|error| RemoteError::InvalidPayload(format!("invalid base64 content: {error}")))?;
    String::from_utf8(bytes)
        .map_err(|error| RemoteError::InvalidPayload(format!("document is not UTF-8: {error}")))
}

fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_base_url(raw: &str) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        RemoteError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if has_http_scheme(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GitHubErrorBody>(body) {
        if let Some(message) = payload.message {
            return message.trim().to_string();
        }
    }

    let trimmed = error_excerpt(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

fn api_error(status: StatusCode, body: &str) -> RemoteError {
    RemoteError::Api {
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

fn put_error(status: StatusCode, body: &str, path: &str) -> RemoteError {
    let is_conflict = status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY
            && error_message(status, body).to_ascii_lowercase().contains("sha"));
    if is_conflict {
        RemoteError::Conflict {
            path: path.to_string(),
        }
    } else {
        api_error(status, body)
    }
}
