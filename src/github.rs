//! GitHub GraphQL client: summary stats and paginated author aggregation

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::Config;
use crate::extract::RepoId;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Edges fetched per pagination page (the API caps connections at 100).
const PAGE_SIZE: u32 = 100;

// === Error Classification ===

/// Errors from the query endpoint. Only `Transport`/`Http` are fatal for a
/// call; a missing repository or a malformed response is recovered locally
/// as an empty result plus a warning, so corpus runs survive deleted repos.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API error {status}")]
    Transport { status: reqwest::StatusCode },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed API response")]
    Malformed,
}

// === Transport ===

/// Query transport seam: a single POST of `{query: ...}` returning parsed
/// JSON. Pagination and parsing are generic over this so tests can inject
/// fake page sequences.
pub trait GraphqlTransport {
    fn post_graphql(&self, query: &str) -> Result<serde_json::Value, GithubError>;
}

/// Authenticated GitHub API client.
pub struct GithubClient {
    http: reqwest::blocking::Client,
    token: String,
    debug: bool,
}

impl GithubClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            http: Config::http_client()?,
            token: config.token.clone(),
            debug: config.debug,
        })
    }
}

impl GraphqlTransport for GithubClient {
    fn post_graphql(&self, query: &str) -> Result<serde_json::Value, GithubError> {
        let start = std::time::Instant::now();
        let response = self
            .http
            .post(GRAPHQL_URL)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&serde_json::json!({ "query": query }))
            .send()?;

        if self.debug {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            eprintln!(
                "\x1b[90m[{}] POST {} ... {}ms\x1b[0m",
                now,
                GRAPHQL_URL,
                start.elapsed().as_millis()
            );
        }

        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Transport { status });
        }
        Ok(response.json()?)
    }
}

// === Response types ===

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl<T> GraphqlEnvelope<T> {
    /// First server-reported error message, if any. These accompany null
    /// data for deleted/renamed repositories and are not fatal.
    fn error_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    repository: Option<RepositorySummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositorySummary {
    created_at: Option<String>,
    pushed_at: Option<String>,
    primary_language: Option<NamedNode>,
    license_info: Option<LicenseNode>,
    forks: CountNode,
    stargazers: CountNode,
    pull_requests: CountNode,
    issues: CountNode,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseNode {
    spdx_id: Option<String>,
    pseudo_license: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountNode {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct AuthorsData {
    // The connection field name varies with the contribution kind
    // ("issues" / "pullRequests"), hence the map.
    repository: Option<HashMap<String, AuthorConnection>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorConnection {
    page_info: PageInfo,
    edges: Vec<AuthorEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct AuthorEdge {
    node: Option<AuthorNode>,
}

#[derive(Debug, Deserialize)]
struct AuthorNode {
    author: Option<LoginNode>,
}

#[derive(Debug, Deserialize)]
struct LoginNode {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitData {
    #[serde(rename = "rateLimit")]
    rate_limit: RateLimit,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub limit: u64,
    pub cost: u64,
    pub remaining: u64,
    pub reset_at: String,
}

/// Single-shot summary fields for one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub created_at: Option<String>,
    pub pushed_at: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub pseudo_license: Option<bool>,
    pub n_forks: u64,
    pub n_stars: u64,
    pub n_pull_requests: u64,
    pub n_issues: u64,
}

/// Which contribution connection to aggregate authors from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    Issues,
    PullRequests,
}

impl ContributionKind {
    pub fn field(self) -> &'static str {
        match self {
            ContributionKind::Issues => "issues",
            ContributionKind::PullRequests => "pullRequests",
        }
    }
}

// === Queries ===

fn summary_query(repo: &RepoId) -> String {
    format!(
        r#"query RepoStats {{
            repository(owner:"{}", name:"{}") {{
                createdAt
                pushedAt
                primaryLanguage {{ name }}
                licenseInfo {{ spdxId pseudoLicense }}
                forks(first:0) {{ totalCount }}
                stargazers(first:0) {{ totalCount }}
                pullRequests(first:0) {{ totalCount }}
                issues(first:0) {{ totalCount }}
            }}
        }}"#,
        repo.owner, repo.name
    )
}

fn authors_query(repo: &RepoId, kind: ContributionKind, first: u32, after: Option<&str>) -> String {
    let after_clause = match after {
        Some(cursor) => format!(", after:\"{}\"", cursor),
        None => String::new(),
    };
    format!(
        r#"query Authors {{
            repository(owner:"{}", name:"{}") {{
                {}(first:{}{}) {{
                    totalCount
                    pageInfo {{ endCursor hasNextPage }}
                    edges {{ node {{ author {{ login }} }} }}
                }}
            }}
        }}"#,
        repo.owner,
        repo.name,
        kind.field(),
        first,
        after_clause
    )
}

fn warn_skipped(repo: &RepoId, reason: &str) {
    eprintln!("  \x1b[33m⚠\x1b[0m {}: {}", repo.full_name(), reason);
}

// === Operations ===

/// Fetch the single-query summary fields for a repository.
///
/// A null repository (renamed/deleted/inaccessible) or an unexpected
/// response shape yields a default record and a warning, never an error;
/// only transport failures propagate.
pub fn summary_stats<T: GraphqlTransport>(
    transport: &T,
    repo: &RepoId,
) -> Result<SummaryStats, GithubError> {
    let value = transport.post_graphql(&summary_query(repo))?;
    let envelope: GraphqlEnvelope<SummaryData> = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(_) => {
            warn_skipped(repo, "malformed summary response");
            return Ok(SummaryStats::default());
        }
    };
    let message = envelope.error_message().unwrap_or("not found").to_string();
    let Some(repository) = envelope.data.and_then(|d| d.repository) else {
        warn_skipped(repo, &message);
        return Ok(SummaryStats::default());
    };

    Ok(SummaryStats {
        created_at: repository.created_at,
        pushed_at: repository.pushed_at,
        language: repository.primary_language.map(|l| l.name),
        license: repository.license_info.as_ref().and_then(|l| l.spdx_id.clone()),
        pseudo_license: repository.license_info.map(|l| l.pseudo_license),
        n_forks: repository.forks.total_count,
        n_stars: repository.stargazers.total_count,
        n_pull_requests: repository.pull_requests.total_count,
        n_issues: repository.issues.total_count,
    })
}

/// One page of the author listing.
struct AuthorPage {
    logins: Vec<String>,
    end_cursor: Option<String>,
    has_next_page: bool,
}

/// Fetch a single author page as a pure function of (repo, kind, cursor).
/// `Ok(None)` means the repository came back null or the response shape was
/// unexpected; the caller short-circuits with an empty result.
fn fetch_author_page<T: GraphqlTransport>(
    transport: &T,
    repo: &RepoId,
    kind: ContributionKind,
    after: Option<&str>,
) -> Result<Option<AuthorPage>, GithubError> {
    let query = authors_query(repo, kind, PAGE_SIZE, after);
    let value = transport.post_graphql(&query)?;
    let envelope: GraphqlEnvelope<AuthorsData> = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(_) => {
            warn_skipped(repo, "malformed authors response");
            return Ok(None);
        }
    };
    let message = envelope.error_message().unwrap_or("not found").to_string();
    let Some(mut repository) = envelope.data.and_then(|d| d.repository) else {
        warn_skipped(repo, &message);
        return Ok(None);
    };
    let Some(connection) = repository.remove(kind.field()) else {
        warn_skipped(repo, "missing contribution field");
        return Ok(None);
    };

    // Null authors (deleted accounts) are silently skipped.
    let logins = connection
        .edges
        .into_iter()
        .filter_map(|edge| edge.node)
        .filter_map(|node| node.author)
        .map(|author| author.login)
        .collect();

    Ok(Some(AuthorPage {
        logins,
        end_cursor: connection.page_info.end_cursor,
        has_next_page: connection.page_info.has_next_page,
    }))
}

/// Collect the author login of every issue or pull request on a repository,
/// following cursor pagination until the API reports no further pages.
pub fn collect_authors<T: GraphqlTransport>(
    transport: &T,
    repo: &RepoId,
    kind: ContributionKind,
) -> Result<Vec<String>, GithubError> {
    let mut authors = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let Some(page) = fetch_author_page(transport, repo, kind, cursor.as_deref())? else {
            return Ok(Vec::new());
        };
        authors.extend(page.logins);
        if !page.has_next_page {
            break;
        }
        cursor = page.end_cursor;
    }
    Ok(authors)
}

/// Query the GraphQL API's own rate limit status.
pub fn rate_limit<T: GraphqlTransport>(transport: &T) -> Result<RateLimit, GithubError> {
    let value = transport.post_graphql("{ rateLimit { limit cost remaining resetAt } }")?;
    let envelope: GraphqlEnvelope<RateLimitData> =
        serde_json::from_value(value).map_err(|_| GithubError::Malformed)?;
    envelope
        .data
        .map(|d| d.rate_limit)
        .ok_or(GithubError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// Replays a fixed sequence of responses.
    struct FakeTransport {
        responses: RefCell<Vec<Value>>,
        queries: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn new(responses: Vec<Value>) -> Self {
            Self {
                responses: RefCell::new(responses),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl GraphqlTransport for FakeTransport {
        fn post_graphql(&self, query: &str) -> Result<Value, GithubError> {
            self.queries.borrow_mut().push(query.to_string());
            let mut responses = self.responses.borrow_mut();
            assert!(!responses.is_empty(), "transport queried past its script");
            Ok(responses.remove(0))
        }
    }

    fn repo() -> RepoId {
        RepoId::parse("github.com/keplergo/lightkurve").unwrap()
    }

    fn author_page(logins: &[Option<&str>], cursor: &str, has_next: bool) -> Value {
        let edges: Vec<Value> = logins
            .iter()
            .map(|login| match login {
                Some(name) => json!({ "node": { "author": { "login": name } } }),
                None => json!({ "node": { "author": null } }),
            })
            .collect();
        json!({
            "data": {
                "repository": {
                    "issues": {
                        "totalCount": 237,
                        "pageInfo": { "endCursor": cursor, "hasNextPage": has_next },
                        "edges": edges,
                    }
                }
            }
        })
    }

    #[test]
    fn collect_authors_exhausts_pagination_and_skips_null_authors() {
        let page1: Vec<Option<&str>> = (0..100).map(|_| Some("alice")).collect();
        let mut page2: Vec<Option<&str>> = (0..99).map(|_| Some("bob")).collect();
        page2.push(None); // deleted account
        let page3: Vec<Option<&str>> = (0..37).map(|_| Some("carol")).collect();

        let transport = FakeTransport::new(vec![
            author_page(&page1, "cursor-1", true),
            author_page(&page2, "cursor-2", true),
            author_page(&page3, "cursor-3", false),
        ]);

        let authors = collect_authors(&transport, &repo(), ContributionKind::Issues).unwrap();
        assert_eq!(authors.len(), 236);

        // Cursor from each page must be threaded into the next query.
        let queries = transport.queries.borrow();
        assert_eq!(queries.len(), 3);
        assert!(!queries[0].contains("after:"));
        assert!(queries[1].contains("after:\"cursor-1\""));
        assert!(queries[2].contains("after:\"cursor-2\""));
    }

    #[test]
    fn collect_authors_missing_repository_short_circuits_empty() {
        let transport = FakeTransport::new(vec![json!({ "data": { "repository": null } })]);
        let authors = collect_authors(&transport, &repo(), ContributionKind::PullRequests).unwrap();
        assert!(authors.is_empty());
    }

    #[test]
    fn collect_authors_malformed_response_short_circuits_empty() {
        let transport = FakeTransport::new(vec![json!({ "unexpected": true })]);
        let authors = collect_authors(&transport, &repo(), ContributionKind::Issues).unwrap();
        assert!(authors.is_empty());
    }

    #[test]
    fn missing_repository_mid_pagination_discards_partial_result() {
        let page1: Vec<Option<&str>> = (0..100).map(|_| Some("alice")).collect();
        let transport = FakeTransport::new(vec![
            author_page(&page1, "cursor-1", true),
            json!({ "data": { "repository": null } }),
        ]);
        let authors = collect_authors(&transport, &repo(), ContributionKind::Issues).unwrap();
        assert!(authors.is_empty());
    }

    /// Always fails at the transport layer.
    struct DownTransport;

    impl GraphqlTransport for DownTransport {
        fn post_graphql(&self, _query: &str) -> Result<Value, GithubError> {
            Err(GithubError::Transport {
                status: reqwest::StatusCode::BAD_GATEWAY,
            })
        }
    }

    #[test]
    fn transport_failure_propagates_instead_of_emptying_results() {
        let authors = collect_authors(&DownTransport, &repo(), ContributionKind::Issues);
        assert!(matches!(
            authors,
            Err(GithubError::Transport { status }) if status == reqwest::StatusCode::BAD_GATEWAY
        ));

        let stats = summary_stats(&DownTransport, &repo());
        assert!(matches!(stats, Err(GithubError::Transport { .. })));
    }

    #[test]
    fn summary_stats_parses_all_fields() {
        let transport = FakeTransport::new(vec![json!({
            "data": {
                "repository": {
                    "createdAt": "2018-01-12T19:47:29Z",
                    "pushedAt": "2019-05-02T17:04:34Z",
                    "primaryLanguage": { "name": "Python" },
                    "licenseInfo": { "spdxId": "MIT", "pseudoLicense": false },
                    "forks": { "totalCount": 53 },
                    "stargazers": { "totalCount": 95 },
                    "pullRequests": { "totalCount": 263 },
                    "issues": { "totalCount": 243 },
                }
            }
        })]);

        let stats = summary_stats(&transport, &repo()).unwrap();
        assert_eq!(stats.language.as_deref(), Some("Python"));
        assert_eq!(stats.license.as_deref(), Some("MIT"));
        assert_eq!(stats.pseudo_license, Some(false));
        assert_eq!(stats.n_forks, 53);
        assert_eq!(stats.n_stars, 95);
        assert_eq!(stats.n_pull_requests, 263);
        assert_eq!(stats.n_issues, 243);
    }

    #[test]
    fn summary_stats_null_repository_yields_default_record() {
        let transport = FakeTransport::new(vec![json!({ "data": { "repository": null } })]);
        let stats = summary_stats(&transport, &repo()).unwrap();
        assert_eq!(stats, SummaryStats::default());
    }

    #[test]
    fn summary_stats_tolerates_null_language_and_license() {
        let transport = FakeTransport::new(vec![json!({
            "data": {
                "repository": {
                    "createdAt": null,
                    "pushedAt": null,
                    "primaryLanguage": null,
                    "licenseInfo": null,
                    "forks": { "totalCount": 0 },
                    "stargazers": { "totalCount": 0 },
                    "pullRequests": { "totalCount": 0 },
                    "issues": { "totalCount": 0 },
                }
            }
        })]);

        let stats = summary_stats(&transport, &repo()).unwrap();
        assert_eq!(stats.language, None);
        assert_eq!(stats.license, None);
        assert_eq!(stats.pseudo_license, None);
    }

    #[test]
    fn rate_limit_parses_quota() {
        let transport = FakeTransport::new(vec![json!({
            "data": {
                "rateLimit": {
                    "limit": 5000, "cost": 1, "remaining": 4999,
                    "resetAt": "2019-05-02T18:00:00Z",
                }
            }
        })]);
        let limit = rate_limit(&transport).unwrap();
        assert_eq!(limit.remaining, 4999);
    }
}
