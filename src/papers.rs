//! Literature-provider interface and paper text acquisition
//!
//! The literature search itself is an external collaborator: anything that
//! can answer a free-text query with identifier/citation-count records fits
//! behind `LiteratureProvider`. PDF-to-text conversion is likewise external
//! and sits behind `TextExtractor`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::PathBuf;

/// arXiv identifiers as they appear in literature metadata:
/// "arXiv:2301.12345", "arXiv:2301.12345v2" or old-style "arXiv:astro-ph/0601001"
static ARXIV_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"arXiv:((?:\d{4}\.\d{4,5})(?:v\d+)?|[a-zA-Z.-]+/\d{7})").unwrap()
});

/// One paper returned by a literature query.
#[derive(Debug, Clone)]
pub struct Paper {
    pub identifiers: Vec<String>,
    pub citation_count: u64,
}

/// Black-box literature search: free-text query in, papers out.
pub trait LiteratureProvider {
    fn search(&self, query: &str) -> Result<Vec<Paper>>;
}

/// File-backed provider reading a pre-exported query result, one
/// `identifier,citation_count` line per paper. The query argument is ignored;
/// it was answered when the export was produced.
pub struct FilePaperSource {
    path: PathBuf,
}

impl FilePaperSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LiteratureProvider for FilePaperSource {
    fn search(&self, _query: &str) -> Result<Vec<Paper>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read paper list {}", self.path.display()))?;
        let mut papers = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (identifier, citations) = match line.rsplit_once(',') {
                Some((id, count)) => (id.trim(), count.trim().parse::<u64>().unwrap_or(0)),
                None => (line, 0),
            };
            papers.push(Paper {
                identifiers: vec![identifier.to_string()],
                citation_count: citations,
            });
        }
        Ok(papers)
    }
}

/// Pick the arXiv identifiers out of each paper's identifier list, paired
/// with the paper's citation count.
pub fn arxiv_ids(papers: &[Paper]) -> Vec<(String, u64)> {
    let mut ids = Vec::new();
    for paper in papers {
        for identifier in &paper.identifiers {
            if let Some(cap) = ARXIV_ID_RE.captures(identifier) {
                ids.push((cap[1].to_string(), paper.citation_count));
            }
        }
    }
    ids
}

/// Download the PDF for an arXiv identifier.
pub fn fetch_pdf(http: &reqwest::blocking::Client, arxiv_id: &str) -> Result<Vec<u8>> {
    let url = format!("https://arxiv.org/pdf/{}.pdf", arxiv_id);
    let response = http
        .get(&url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?
        .error_for_status()
        .with_context(|| format!("arXiv returned an error for {}", arxiv_id))?;
    Ok(response.bytes().context("Failed to read PDF body")?.to_vec())
}

/// External PDF-to-text conversion seam.
pub trait TextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Pass-through extractor for already-converted text. Folds newlines to
/// spaces the way the original page converter emitted its output, so span
/// extraction sees one continuous line.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).replace('\n', " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arxiv_ids_filters_non_arxiv_identifiers() {
        let papers = vec![Paper {
            identifiers: vec![
                "2019AJ....157...64L".to_string(),
                "arXiv:1812.01606".to_string(),
                "10.3847/1538-3881/aae8e5".to_string(),
            ],
            citation_count: 42,
        }];
        assert_eq!(arxiv_ids(&papers), vec![("1812.01606".to_string(), 42)]);
    }

    #[test]
    fn arxiv_ids_handles_old_style_identifiers() {
        let papers = vec![Paper {
            identifiers: vec!["arXiv:astro-ph/0601001".to_string()],
            citation_count: 7,
        }];
        assert_eq!(arxiv_ids(&papers), vec![("astro-ph/0601001".to_string(), 7)]);
    }

    #[test]
    fn plain_text_extractor_folds_newlines() {
        let text = PlainTextExtractor
            .extract_text(b"github.com/\norg/proj here")
            .unwrap();
        assert_eq!(text, "github.com/ org/proj here");
    }
}
