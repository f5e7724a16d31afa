//! Assembly of per-repository records
//!
//! Pure merge of the single-shot summary, the paginated author sets and the
//! probe signals into one output record per canonical identifier.

use std::collections::HashSet;

use crate::extract::RepoId;
use crate::github::SummaryStats;
use crate::probe::QuerySignals;

/// Terminal aggregate for one repository; one output row.
#[derive(Debug, Clone)]
pub struct RepositoryRecord {
    pub id: RepoId,
    pub summary: SummaryStats,
    pub n_issues_unique_authors: usize,
    pub n_pull_requests_unique_authors: usize,
    /// Union of issue and pull-request authors: the community size.
    pub n_unique_authors: usize,
    pub signals: QuerySignals,
}

/// Merge the enrichment results for one repository. No network, no I/O.
pub fn assemble(
    id: RepoId,
    summary: SummaryStats,
    issue_authors: &[String],
    pull_request_authors: &[String],
    signals: QuerySignals,
) -> RepositoryRecord {
    let issues: HashSet<&str> = issue_authors.iter().map(String::as_str).collect();
    let pull_requests: HashSet<&str> =
        pull_request_authors.iter().map(String::as_str).collect();
    let union: HashSet<&str> = issues.union(&pull_requests).copied().collect();

    RepositoryRecord {
        id,
        summary,
        n_issues_unique_authors: issues.len(),
        n_pull_requests_unique_authors: pull_requests.len(),
        n_unique_authors: union.len(),
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn author_counts_are_deduplicated_per_kind() {
        let record = assemble(
            RepoId::parse("org/proj").unwrap(),
            SummaryStats::default(),
            &strings(&["alice", "bob", "alice"]),
            &strings(&["bob", "bob", "carol"]),
            QuerySignals::default(),
        );
        assert_eq!(record.n_issues_unique_authors, 2);
        assert_eq!(record.n_pull_requests_unique_authors, 2);
    }

    #[test]
    fn community_size_is_the_union_of_both_kinds() {
        let record = assemble(
            RepoId::parse("org/proj").unwrap(),
            SummaryStats::default(),
            &strings(&["alice", "bob"]),
            &strings(&["bob", "carol"]),
            QuerySignals::default(),
        );
        assert_eq!(record.n_unique_authors, 3);
    }

    #[test]
    fn variant_mentions_of_one_repository_assemble_into_one_record() {
        use crate::extract::{extract_mentions, normalize_mentions};

        let text = "code at github.com/org/proj. see also (github.com/org/proj) online";
        let mentions = extract_mentions(text, "github.com/");
        let repos = normalize_mentions(mentions.iter().map(String::as_str));
        let records: Vec<RepositoryRecord> = repos
            .into_iter()
            .map(|id| assemble(id, SummaryStats::default(), &[], &[], QuerySignals::default()))
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.to_string(), "github.com/org/proj");
    }

    #[test]
    fn empty_author_lists_yield_zero_counts() {
        let record = assemble(
            RepoId::parse("org/proj").unwrap(),
            SummaryStats::default(),
            &[],
            &[],
            QuerySignals::default(),
        );
        assert_eq!(record.n_issues_unique_authors, 0);
        assert_eq!(record.n_pull_requests_unique_authors, 0);
        assert_eq!(record.n_unique_authors, 0);
    }
}
