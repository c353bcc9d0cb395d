use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use url::Url;

use super::client::CircleCiClient;
use super::types::StatusFilter;
use super::urls::{page_url, plan_pages, redacted};
use crate::auth::Token;
use crate::error::{CIToolError, Result};
use crate::output::DownloadProgress;

/// What to download and where to put it.
#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub token: Token,
    pub vcs_type: String,
    pub username: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub status: Option<StatusFilter>,
    pub offset: i64,
    pub limit: i64,
    pub download_dir: PathBuf,
}

impl DownloadParams {
    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_deref())
    }

    pub fn repository(&self) -> Option<&str> {
        non_empty(self.repository.as_deref())
    }

    pub fn branch(&self) -> Option<&str> {
        non_empty(self.branch.as_deref())
    }

    /// Checks the parameters before any network or file activity.
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(CIToolError::Config("Circle CI token is empty".to_string()));
        }
        if self.vcs_type.trim().is_empty() {
            return Err(CIToolError::Config("VCS name cannot be empty".to_string()));
        }
        if self.username().is_some() != self.repository().is_some() {
            return Err(CIToolError::Config(format!(
                "Only one of the username (\"{}\") or repository name (\"{}\") is provided",
                self.username().unwrap_or_default(),
                self.repository().unwrap_or_default()
            )));
        }
        if let Some(branch) = self.branch() {
            if self.username().is_none() {
                return Err(CIToolError::Config(format!(
                    "branch name (\"{branch}\") cannot be provided without username and repository name"
                )));
            }
        }
        if self.offset < 0 {
            return Err(CIToolError::Config(format!(
                "start offset cannot be negative, it is {}",
                self.offset
            )));
        }
        if self.limit <= 0 {
            return Err(CIToolError::Config(format!(
                "limit must be > 0, it is {}",
                self.limit
            )));
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Downloads build results page by page into `from-{start}-to-{end}.json` files.
pub struct Downloader {
    client: CircleCiClient,
    base_url: Url,
}

impl Downloader {
    pub fn new(client: CircleCiClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CIToolError::Config(format!("Invalid base URL: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Fetches every page of the requested range sequentially.
    ///
    /// Returns the written files in download order. The first failing page aborts the run.
    pub async fn download(&self, params: &DownloadParams) -> Result<Vec<PathBuf>> {
        params.validate()?;

        let offset = params.offset.unsigned_abs();
        let limit = params.limit.unsigned_abs();
        let pages = plan_pages(offset, limit);
        info!(
            "Downloading results {} to {} in {} pages",
            offset,
            offset + limit - 1,
            pages.len()
        );

        let progress = DownloadProgress::start(pages.len());
        let mut written = Vec::with_capacity(pages.len());

        for page in pages {
            debug!(
                "Downloading from {} to {} (both inclusive)",
                page.start,
                page.end()
            );
            let url = page_url(&self.base_url, params, page)?;
            debug!("Downloading from {}", redacted(&url));

            let body = self.client.fetch_page(&url).await?;
            let path = params.download_dir.join(page.file_name());
            write_page(&path, &body)?;
            debug!("Wrote {}", path.display());

            progress.page_done(&page.file_name());
            written.push(path);
        }

        progress.finish(written.len());
        debug!("Downloading finished");
        Ok(written)
    }
}

fn write_page(path: &Path, body: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn params(dir: &Path) -> DownloadParams {
        DownloadParams {
            token: Token::from("secret"),
            vcs_type: "github".to_string(),
            username: None,
            repository: None,
            branch: None,
            status: None,
            offset: 0,
            limit: 150,
            download_dir: dir.to_path_buf(),
        }
    }

    mod validate {
        use super::*;

        fn assert_invalid(params: &DownloadParams, needle: &str) {
            match params.validate() {
                Err(CIToolError::Config(message)) => {
                    assert!(message.contains(needle), "{message} should mention {needle}");
                }
                other => panic!("expected config error, got {other:?}"),
            }
        }

        #[test]
        fn accepts_defaults() {
            assert!(params(Path::new("data")).validate().is_ok());
        }

        #[test]
        fn rejects_empty_token() {
            let mut p = params(Path::new("data"));
            p.token = Token::from("   ");
            assert_invalid(&p, "token is empty");
        }

        #[test]
        fn rejects_empty_vcs_type() {
            let mut p = params(Path::new("data"));
            p.vcs_type = String::new();
            assert_invalid(&p, "VCS");
        }

        #[test]
        fn rejects_username_without_repository() {
            let mut p = params(Path::new("data"));
            p.username = Some("celo-org".to_string());
            assert_invalid(&p, "Only one of");
        }

        #[test]
        fn rejects_repository_without_username() {
            let mut p = params(Path::new("data"));
            p.repository = Some("celo-monorepo".to_string());
            p.username = Some(String::new());
            assert_invalid(&p, "Only one of");
        }

        #[test]
        fn rejects_branch_without_project() {
            let mut p = params(Path::new("data"));
            p.branch = Some("master".to_string());
            assert_invalid(&p, "branch name");
        }

        #[test]
        fn rejects_negative_offset() {
            let mut p = params(Path::new("data"));
            p.offset = -1;
            assert_invalid(&p, "negative");
        }

        #[test]
        fn rejects_non_positive_limit() {
            let mut p = params(Path::new("data"));
            p.limit = 0;
            assert_invalid(&p, "limit must be > 0");
        }
    }

    #[tokio::test]
    async fn test_download_writes_one_file_per_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/recent-builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("circle-token".into(), "secret".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("limit".into(), "100".into()),
                Matcher::UrlEncoded("shallow".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"status":"success"}]"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/recent-builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "100".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let download_dir = dir.path().join("circleci_data");
        let client = CircleCiClient::new(5)
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        let downloader = Downloader::new(client, &format!("{}/", server.url())).unwrap();

        let files = downloader.download(&params(&download_dir)).await.unwrap();

        assert_eq!(
            files,
            vec![
                download_dir.join("from-0-to-99.json"),
                download_dir.join("from-100-to-149.json"),
            ]
        );
        assert_eq!(
            fs::read_to_string(&files[0]).unwrap(),
            r#"[{"status":"success"}]"#
        );
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_params_fail_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut p = params(dir.path());
        p.limit = -5;
        let downloader =
            Downloader::new(CircleCiClient::new(1).unwrap(), &server.url()).unwrap();

        assert!(downloader.download(&p).await.is_err());
        mock.assert_async().await;
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_project_download_sends_status_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/project/github/celo-org/celo-monorepo/tree/master")
            .match_query(Matcher::UrlEncoded("filter".into(), "completed".into()))
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut p = params(dir.path());
        p.username = Some("celo-org".to_string());
        p.repository = Some("celo-monorepo".to_string());
        p.branch = Some("master".to_string());
        p.status = Some(StatusFilter::Completed);
        p.limit = 10;
        let downloader =
            Downloader::new(CircleCiClient::new(1).unwrap(), &server.url()).unwrap();

        let files = downloader.download(&p).await.unwrap();

        assert_eq!(files, vec![dir.path().join("from-0-to-9.json")]);
        mock.assert_async().await;
    }
}
