//! Heuristic quality probes against a repository's file tree
//!
//! Each signal is derived from ordered existence probes (raw file paths,
//! tree directories, the project pages host) evaluated first-success-wins.
//! A failed probe is absence of evidence, never an error; a repository whose
//! root page is unreachable short-circuits to the all-default record.

use crate::extract::RepoId;

/// Branches tried for raw-file and tree probes, in order.
const BRANCHES: &[&str] = &["master", "main"];

const README_NAMES: &[&str] = &["README", "readme"];
const README_EXTENSIONS: &[&str] = &[".md", ".rst", "", ".txt"];

/// Readme keywords that count as installation instructions.
const INSTALL_KEYWORDS: &[&str] = &[
    "pip ",
    "install ",
    "installation ",
    "installation instructions ",
    "pypi",
    "conda ",
];

const CI_FILES: &[&str] = &[
    ".travis.yml",
    "appveyor.yml",
    "azure-pipelines.yml",
    ".circleci/config.yml",
    "Jenkinsfile",
];

const DOC_DIRS: &[&str] = &["docs", "doc", "documentation"];
const EXAMPLE_DIRS: &[&str] = &["examples", "example", "tutorials", "notebooks", "demos"];

/// Existence/content probes over constructed URLs. The HTTP implementation
/// treats any non-success status or timeout as a miss.
pub trait ProbeTransport {
    fn exists(&self, url: &str) -> bool;
    fn fetch(&self, url: &str) -> Option<String>;
}

/// Blocking HTTP prober.
pub struct HttpProber {
    http: reqwest::blocking::Client,
}

impl HttpProber {
    pub fn new(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }
}

impl ProbeTransport for HttpProber {
    fn exists(&self, url: &str) -> bool {
        self.http
            .get(url)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn fetch(&self, url: &str) -> Option<String> {
        let response = self.http.get(url).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().ok()
    }
}

/// The fixed signal set per repository. Flags are write-once-true: probes
/// only ever raise them, and absence of evidence leaves the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySignals {
    pub exists: bool,
    pub readme: bool,
    pub readme_length: u64,
    pub installation: bool,
    pub ci: bool,
    pub docs: bool,
    pub docs_path: Option<String>,
    pub fancy_docs: bool,
    pub examples: bool,
    pub requirements: bool,
}

// === URL construction ===

fn root_url(repo: &RepoId) -> String {
    format!("https://github.com/{}/{}", repo.owner, repo.name)
}

fn raw_url(repo: &RepoId, branch: &str, path: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/{}/{}/{}/{}",
        repo.owner, repo.name, branch, path
    )
}

fn tree_url(repo: &RepoId, branch: &str, path: &str) -> String {
    format!(
        "https://github.com/{}/{}/tree/{}/{}",
        repo.owner, repo.name, branch, path
    )
}

fn pages_url(repo: &RepoId) -> String {
    format!("https://{}.github.io/{}", repo.owner, repo.name)
}

// === Probe helpers ===

/// Does `path` exist as a raw file on any candidate branch?
fn raw_exists<T: ProbeTransport>(transport: &T, repo: &RepoId, path: &str) -> bool {
    BRANCHES
        .iter()
        .any(|branch| transport.exists(&raw_url(repo, branch, path)))
}

/// Does `path` exist as a tree directory on any candidate branch?
fn tree_exists<T: ProbeTransport>(transport: &T, repo: &RepoId, path: &str) -> bool {
    BRANCHES
        .iter()
        .any(|branch| transport.exists(&tree_url(repo, branch, path)))
}

/// First readme variant that fetches successfully, across branches,
/// candidate names and extensions.
fn find_readme<T: ProbeTransport>(transport: &T, repo: &RepoId) -> Option<String> {
    for branch in BRANCHES {
        for name in README_NAMES {
            for ext in README_EXTENSIONS {
                let path = format!("{}{}", name, ext);
                if let Some(content) = transport.fetch(&raw_url(repo, branch, &path)) {
                    return Some(content);
                }
            }
        }
    }
    None
}

/// Case-insensitive keyword check against a captured readme.
fn readme_contains(readme: Option<&String>, keywords: &[&str]) -> bool {
    let Some(content) = readme else {
        return false;
    };
    let lower = content.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Run every probe step for one repository.
pub fn probe<T: ProbeTransport>(transport: &T, repo: &RepoId) -> QuerySignals {
    let mut signals = QuerySignals::default();

    // Step 1: existence. No point probing a repository that is gone.
    if !transport.exists(&root_url(repo)) {
        return signals;
    }
    signals.exists = true;

    // Step 2: readme content and length.
    let readme = find_readme(transport, repo);
    if let Some(content) = &readme {
        signals.readme = true;
        signals.readme_length = content.chars().count() as u64;
    }

    // Step 3: installation evidence, any-of.
    signals.installation = raw_exists(transport, repo, "setup.py")
        || raw_exists(transport, repo, "INSTALL")
        || raw_exists(transport, repo, "makefile")
        || raw_exists(transport, repo, "Makefile")
        || readme_contains(readme.as_ref(), INSTALL_KEYWORDS);

    // Step 4: CI configuration, first hit wins.
    signals.ci = CI_FILES.iter().any(|file| raw_exists(transport, repo, file))
        || tree_exists(transport, repo, ".github/workflows");

    // Step 5: documentation directory; remember where we found it.
    signals.docs_path = DOC_DIRS
        .iter()
        .find(|dir| tree_exists(transport, repo, dir))
        .map(|dir| (*dir).to_string());
    signals.docs = signals.docs_path.is_some();

    // Step 6: hosted pages, else a readthedocs mention.
    signals.fancy_docs =
        transport.exists(&pages_url(repo)) || readme_contains(readme.as_ref(), &["readthedocs"]);

    // Step 7: examples at the top level, under the docs dir, or in the readme.
    signals.examples = EXAMPLE_DIRS.iter().any(|dir| tree_exists(transport, repo, dir))
        || signals.docs_path.as_ref().is_some_and(|docs| {
            EXAMPLE_DIRS
                .iter()
                .any(|dir| tree_exists(transport, repo, &format!("{}/{}", docs, dir)))
        })
        || readme_contains(readme.as_ref(), &["tutorials", "examples"]);

    // Step 8: requirements manifest; finding one also implies installability.
    signals.requirements = raw_exists(transport, repo, "requirements.txt");
    if signals.requirements {
        signals.installation = true;
    }

    signals
}
