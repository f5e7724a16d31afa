//! Repository mention extraction from plain text
//!
//! Scans converted full-text for marker substrings (e.g. "github.com/") and
//! normalizes the captured spans into canonical host/owner/repo identifiers.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// How far past a marker we look for the end of a mention.
const LOOKAHEAD_CHARS: usize = 100;

/// Characters stripped from owner/repo segments during normalization
/// (PDF conversion artifacts: line breaks, parentheses, commas).
const NOISE_CHARS: &[char] = &['\n', '(', ')', ','];

/// A normalized repository identifier: lower-cased host/owner/repo.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoId {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse "owner/repo", "host/owner/repo" or a full URL into a RepoId.
    /// The host defaults to github.com when only two segments are given.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
        let (host, owner, name) = match parts.as_slice() {
            // Owner logins cannot contain dots; a dotted first segment is a host.
            [owner, name] if !owner.contains('.') => ("github.com", *owner, *name),
            [host, owner, name, ..] if host.contains('.') => (*host, *owner, *name),
            _ => return None,
        };
        let owner = clean_segment(owner);
        let name = clean_segment(name);
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_lowercase(),
            owner,
            name,
        })
    }

    /// "owner/repo" form used in API queries.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.name)
    }
}

/// Find all non-overlapping occurrences of `marker` in `text` and capture the
/// span from each hit up to the first whitespace or period within the next
/// 100 characters (or end-of-string if none occurs in that window).
///
/// The cursor advances by the marker length only, so a later marker falling
/// inside an earlier capture window is still found; the resulting
/// variant-length spans of the same path are collapsed downstream by
/// normalization.
pub fn extract_mentions(text: &str, marker: &str) -> HashSet<String> {
    let mut mentions = HashSet::new();
    if marker.is_empty() {
        return mentions;
    }
    let mut cursor = 0;
    while let Some(rel) = text[cursor..].find(marker) {
        let hit = cursor + rel;
        let scan_from = hit + marker.len();
        let end = span_end(text, scan_from);
        let span = &text[hit..end];
        if !span.is_empty() {
            mentions.insert(span.to_string());
        }
        cursor = scan_from;
    }
    mentions
}

/// Index of the first whitespace or period within the lookahead window
/// starting at `from`, or end-of-string when the window has neither.
fn span_end(text: &str, from: usize) -> usize {
    for (offset, ch) in text[from..].char_indices().take(LOOKAHEAD_CHARS) {
        if ch.is_whitespace() || ch == '.' {
            return from + offset;
        }
    }
    text.len()
}

/// Reduce raw mentions to a deduplicated set of canonical identifiers.
///
/// A mention must have at least host/owner/repo path depth; segments beyond
/// the repo name are ignored. Owner and repo segments are stripped of noise
/// characters and trailing periods, then lower-cased. Mentions whose owner or
/// repo is empty after stripping are discarded.
pub fn normalize_mentions<'a, I>(mentions: I) -> BTreeSet<RepoId>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut repos = BTreeSet::new();
    for mention in mentions {
        let parts: Vec<&str> = mention.split('/').collect();
        if parts.len() < 3 {
            continue;
        }
        let owner = clean_segment(parts[1]);
        let name = clean_segment(parts[2]);
        if owner.is_empty() || name.is_empty() {
            continue;
        }
        repos.insert(RepoId {
            host: parts[0].to_lowercase(),
            owner,
            name,
        });
    }
    repos
}

/// Strip noise characters anywhere, trim trailing periods, lower-case.
/// Interior periods survive (repo names like "pdfminer.six" are legitimate).
fn clean_segment(segment: &str) -> String {
    let cleaned: String = segment.chars().filter(|c| !NOISE_CHARS.contains(c)).collect();
    cleaned.trim_end_matches('.').to_lowercase()
}
