use url::Url;

use super::download::DownloadParams;
use crate::error::{CIToolError, Result};

/// CircleCI never returns more than this many results per request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// An inclusive range of results fetched with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub start: u64,
    pub count: u64,
}

impl Page {
    pub fn end(&self) -> u64 {
        self.start + self.count - 1
    }

    /// `from-{start}-to-{end}.json`, both ends inclusive.
    pub fn file_name(&self) -> String {
        format!("from-{}-to-{}.json", self.start, self.end())
    }
}

/// Splits `[offset, offset + limit - 1]` into consecutive pages of at most [`MAX_PAGE_SIZE`].
pub fn plan_pages(offset: u64, limit: u64) -> Vec<Page> {
    let end = offset + limit;
    (offset..end)
        .step_by(MAX_PAGE_SIZE as usize)
        .map(|start| Page {
            start,
            count: MAX_PAGE_SIZE.min(end - start),
        })
        .collect()
}

/// Builds the request URL for one page.
///
/// Without a username this is the "recent builds across all projects" endpoint,
/// otherwise the project (and optionally branch) endpoint.
pub fn page_url(base_url: &Url, params: &DownloadParams, page: Page) -> Result<Url> {
    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| CIToolError::Config(format!("Invalid base URL: {base_url}")))?;
        segments.pop_if_empty();

        match (params.username(), params.repository()) {
            (Some(username), Some(repository)) => {
                segments.extend(["project", params.vcs_type.as_str(), username, repository]);
                if let Some(branch) = params.branch() {
                    segments.extend(["tree", branch]);
                }
            }
            _ => {
                segments.push("recent-builds");
            }
        }
    }

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("circle-token", params.token.as_str())
            .append_pair("offset", &page.start.to_string())
            .append_pair("limit", &page.count.to_string())
            .append_pair("shallow", "true");
        if params.username().is_some() {
            if let Some(status) = params.status {
                query.append_pair("filter", status.as_str());
            }
        }
    }

    Ok(url)
}

/// The URL with its `circle-token` value hidden, for logs and error messages.
pub fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "circle-token" {
                "<redacted>".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::providers::circleci::StatusFilter;
    use std::path::PathBuf;

    fn params() -> DownloadParams {
        DownloadParams {
            token: Token::from("secret"),
            vcs_type: "github".to_string(),
            username: None,
            repository: None,
            branch: None,
            status: None,
            offset: 0,
            limit: 10,
            download_dir: PathBuf::from("data"),
        }
    }

    fn page(start: u64, count: u64) -> Page {
        Page { start, count }
    }

    fn base() -> Url {
        Url::parse("https://circleci.com/api/v1.1/").unwrap()
    }

    #[test]
    fn test_plan_pages_splits_into_hundreds() {
        let pages = plan_pages(50, 250);

        assert_eq!(pages, vec![page(50, 100), page(150, 100), page(250, 50)]);
        assert_eq!(pages[2].file_name(), "from-250-to-299.json");
    }

    #[test]
    fn test_plan_pages_single_result() {
        assert_eq!(plan_pages(7, 1), vec![page(7, 1)]);
        assert_eq!(plan_pages(7, 1)[0].file_name(), "from-7-to-7.json");
    }

    #[test]
    fn test_recent_builds_url() {
        let url = page_url(&base(), &params(), page(100, 100)).unwrap();

        assert_eq!(
            url.as_str(),
            "https://circleci.com/api/v1.1/recent-builds?circle-token=secret&offset=100&limit=100&shallow=true"
        );
    }

    #[test]
    fn test_recent_builds_url_ignores_status_filter() {
        let mut params = params();
        params.status = Some(StatusFilter::Completed);

        let url = page_url(&base(), &params, page(0, 1)).unwrap();

        assert!(!url.as_str().contains("filter="));
    }

    #[test]
    fn test_project_url_with_branch_and_filter() {
        let mut params = params();
        params.username = Some("celo-org".to_string());
        params.repository = Some("celo-monorepo".to_string());
        params.branch = Some("release/1.0".to_string());
        params.status = Some(StatusFilter::Failed);

        let url = page_url(&base(), &params, page(0, 5)).unwrap();

        assert_eq!(
            url.path(),
            "/api/v1.1/project/github/celo-org/celo-monorepo/tree/release%2F1.0"
        );
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("filter".to_string(), "failed".to_string())));
        assert!(query.contains(&("shallow".to_string(), "true".to_string())));
        assert!(query.contains(&("limit".to_string(), "5".to_string())));
    }

    #[test]
    fn test_base_url_without_trailing_slash() {
        let base = Url::parse("http://localhost:8080/api/v1.1").unwrap();

        let url = page_url(&base, &params(), page(0, 1)).unwrap();

        assert_eq!(url.path(), "/api/v1.1/recent-builds");
    }

    #[test]
    fn test_redacted_hides_token() {
        let url = page_url(&base(), &params(), page(0, 1)).unwrap();

        let shown = redacted(&url);

        assert!(!shown.contains("secret"));
        assert!(shown.contains("offset=0"));
    }
}
