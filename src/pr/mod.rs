pub mod context;
pub mod types;

pub use context::EventContext;
pub use types::{ChangeStatus, ChangedFile, ChangedSubsets, Comment, FileStatus, PullRequestContext};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Page size for the files listing; GitHub's maximum.
const PER_PAGE: usize = 100;

/// GitHub stops returning files after 3000 entries (30 full pages).
const MAX_PAGES: usize = 30;

const USER_AGENT: &str = "phpmetrics-reporter";

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Invalid repository {0:?}, expected owner/name")]
    InvalidRepository(String),

    #[error("Failed to read event payload: {0}")]
    EventPayload(String),
}

/// Operations the reporter needs from the hosting platform.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Every file changed by the pull request, across all pages.
    async fn list_files(&self, pr: &PullRequestContext) -> Result<Vec<ChangedFile>, PrError>;

    /// Create a new comment on the pull request conversation.
    async fn create_comment(&self, pr: &PullRequestContext, body: &str) -> Result<Comment, PrError>;
}

/// Keep files ending with `extension` and split them into the modified and
/// added buckets. Other statuses are dropped. Order follows the API listing.
pub fn partition_changed_files(files: &[ChangedFile], extension: &str) -> ChangedSubsets {
    let mut subsets = ChangedSubsets::default();
    for file in files.iter().filter(|f| f.filename.ends_with(extension)) {
        match file.status {
            FileStatus::Modified => subsets.modified.push(file.filename.clone()),
            FileStatus::Added => subsets.added.push(file.filename.clone()),
            FileStatus::Other => {}
        }
    }
    subsets
}

/// REST client for api.github.com (or a GitHub Enterprise API root).
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, PrError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn repo_url(&self, pr: &PullRequestContext) -> String {
        format!("{}/repos/{}/{}", self.api_url, pr.owner, pr.repo)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    #[instrument(skip(self, pr), fields(owner = %pr.owner, repo = %pr.repo, pr = pr.number))]
    async fn list_files(&self, pr: &PullRequestContext) -> Result<Vec<ChangedFile>, PrError> {
        let url = format!("{}/pulls/{}/files", self.repo_url(pr), pr.number);
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!(page, "fetching changed files page");
            let batch = self
                .request(reqwest::Method::GET, &url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<ChangedFile>>()
                .await?;

            let last_page = batch.len() < PER_PAGE;
            files.extend(batch);
            if last_page {
                break;
            }
        }

        debug!(files = files.len(), "received changed files");
        Ok(files)
    }

    #[instrument(skip(self, pr, body), fields(owner = %pr.owner, repo = %pr.repo, pr = pr.number, body_bytes = body.len()))]
    async fn create_comment(&self, pr: &PullRequestContext, body: &str) -> Result<Comment, PrError> {
        let url = format!("{}/issues/{}/comments", self.repo_url(pr), pr.number);
        let comment = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?
            .json::<Comment>()
            .await?;
        debug!(comment_id = comment.id, "created comment");
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_pr() -> PullRequestContext {
        PullRequestContext {
            owner: "acme".to_string(),
            repo: "shop".to_string(),
            number: 42,
            git_ref: "refs/pull/42/merge".to_string(),
        }
    }

    fn changed(filename: &str, status: FileStatus) -> ChangedFile {
        ChangedFile {
            filename: filename.to_string(),
            status,
        }
    }

    fn client_for(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&server.uri(), "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_partition_by_status_and_extension() {
        let files = vec![
            changed("src/Cart.php", FileStatus::Modified),
            changed("src/Order.php", FileStatus::Added),
            changed("README.md", FileStatus::Modified),
            changed("src/Legacy.php", FileStatus::Other),
            changed("assets/app.js", FileStatus::Added),
            changed("src/Price.php", FileStatus::Modified),
        ];
        let subsets = partition_changed_files(&files, ".php");
        assert_eq!(subsets.modified, vec!["src/Cart.php", "src/Price.php"]);
        assert_eq!(subsets.added, vec!["src/Order.php"]);
    }

    #[test]
    fn test_partition_empty() {
        let subsets = partition_changed_files(&[], ".php");
        assert!(subsets.modified.is_empty());
        assert!(subsets.added.is_empty());
    }

    #[test]
    fn test_partition_requires_suffix_match() {
        let files = vec![changed("src/php/notes.txt", FileStatus::Modified), changed("x.phpt", FileStatus::Added)];
        assert_eq!(partition_changed_files(&files, ".php"), ChangedSubsets::default());
    }

    #[tokio::test]
    async fn test_list_files_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/pulls/42/files"))
            .and(header("authorization", "Bearer secret"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"filename": "src/Cart.php", "status": "modified"},
                {"filename": "src/Order.php", "status": "added"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let files = client_for(&server).list_files(&sample_pr()).await.unwrap();
        assert_eq!(files, vec![
            changed("src/Cart.php", FileStatus::Modified),
            changed("src/Order.php", FileStatus::Added),
        ]);
    }

    #[tokio::test]
    async fn test_list_files_follows_pages() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..PER_PAGE)
            .map(|i| json!({"filename": format!("src/File{i}.php"), "status": "modified"}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/pulls/42/files"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/pulls/42/files"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"filename": "src/Last.php", "status": "added"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let files = client_for(&server).list_files(&sample_pr()).await.unwrap();
        assert_eq!(files.len(), PER_PAGE + 1);
        assert_eq!(files.last().unwrap().filename, "src/Last.php");
    }

    #[tokio::test]
    async fn test_list_files_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/shop/pulls/42/files"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let err = client_for(&server).list_files(&sample_pr()).await.unwrap_err();
        assert!(matches!(err, PrError::ApiRequest(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_create_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/shop/issues/42/comments"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"body": "## hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 7,
                "html_url": "https://github.com/acme/shop/pull/42#issuecomment-7"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let comment = client_for(&server)
            .create_comment(&sample_pr(), "## hello")
            .await
            .unwrap();
        assert_eq!(comment.id, 7);
        assert!(comment.html_url.ends_with("issuecomment-7"));
    }

    #[tokio::test]
    async fn test_create_comment_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/shop/issues/42/comments"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_comment(&sample_pr(), "body")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
