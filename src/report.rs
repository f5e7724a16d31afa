//! Delimited table output for assembled records
//!
//! Presentation only: one header row, one row per repository, minimal CSV
//! quoting. Downstream reporting scripts consume this file.

use std::io::{self, Write};

use crate::stats::RepositoryRecord;

const HEADER: &[&str] = &[
    "repository",
    "repository_owner",
    "repository_name",
    "createdAt",
    "pushedAt",
    "language",
    "license",
    "pseudoLicense",
    "n_forks",
    "n_stars",
    "n_issues",
    "n_pullRequests",
    "n_issues_unique_authors",
    "n_pullRequests_unique_authors",
    "n_unique_authors",
    "exists",
    "readme",
    "readme_length",
    "installation",
    "CI",
    "docs",
    "docs_path",
    "fancy_docs",
    "examples",
    "requirements",
];

/// Write the header plus one row per record.
pub fn write_table<W: Write>(out: &mut W, records: &[RepositoryRecord]) -> io::Result<()> {
    writeln!(out, "{}", HEADER.join(","))?;
    for record in records {
        writeln!(out, "{}", format_row(record))?;
    }
    Ok(())
}

fn format_row(record: &RepositoryRecord) -> String {
    let summary = &record.summary;
    let signals = &record.signals;
    let fields: Vec<String> = vec![
        record.id.to_string(),
        record.id.owner.clone(),
        record.id.name.clone(),
        opt(summary.created_at.as_deref()),
        opt(summary.pushed_at.as_deref()),
        opt(summary.language.as_deref()),
        opt(summary.license.as_deref()),
        summary
            .pseudo_license
            .map(|b| b.to_string())
            .unwrap_or_default(),
        summary.n_forks.to_string(),
        summary.n_stars.to_string(),
        summary.n_issues.to_string(),
        summary.n_pull_requests.to_string(),
        record.n_issues_unique_authors.to_string(),
        record.n_pull_requests_unique_authors.to_string(),
        record.n_unique_authors.to_string(),
        signals.exists.to_string(),
        signals.readme.to_string(),
        signals.readme_length.to_string(),
        signals.installation.to_string(),
        signals.ci.to_string(),
        signals.docs.to_string(),
        opt(signals.docs_path.as_deref()),
        signals.fancy_docs.to_string(),
        signals.examples.to_string(),
        signals.requirements.to_string(),
    ];
    fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

/// Quote a field only when it contains a delimiter, quote or newline.
fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RepoId;
    use crate::github::SummaryStats;
    use crate::probe::QuerySignals;
    use crate::stats::assemble;

    #[test]
    fn header_and_row_have_matching_field_counts() {
        let record = assemble(
            RepoId::parse("github.com/org/proj").unwrap(),
            SummaryStats::default(),
            &[],
            &[],
            QuerySignals::default(),
        );
        let mut out = Vec::new();
        write_table(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        assert_eq!(
            header.split(',').count(),
            row.split(',').count(),
            "header: {header}\nrow: {row}"
        );
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
