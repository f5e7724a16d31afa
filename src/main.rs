mod config;
mod extract;
mod github;
mod papers;
mod probe;
mod report;
mod stats;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;

use config::Config;
use extract::{extract_mentions, normalize_mentions, RepoId};
use github::{collect_authors, rate_limit, summary_stats, ContributionKind, GithubClient};
use papers::{arxiv_ids, fetch_pdf, FilePaperSource, LiteratureProvider, PlainTextExtractor, TextExtractor};
use probe::HttpProber;
use stats::RepositoryRecord;

const DEFAULT_MARKER: &str = "github.com/";

#[derive(Parser)]
#[command(name = "litscan")]
#[command(about = "Discover and enrich code repositories mentioned in scientific papers")]
#[command(after_help = "\x1b[36mExamples:\x1b[0m
  litscan extract paper.txt            # List repos mentioned in converted text
  litscan stats keplergo/lightkurve    # Enrich a single repository
  litscan run --repos repos.txt --output stats.csv")]
struct Cli {
    /// Show request timing and debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract canonical repository identifiers from a converted text file
    Extract {
        /// Path to the plain-text file
        file: String,

        /// Marker substring anchoring each mention
        #[arg(short, long, default_value = DEFAULT_MARKER)]
        marker: String,
    },

    /// Download one arXiv paper and list the repositories it mentions
    Arxiv {
        /// arXiv identifier (e.g. "1812.01606")
        arxiv_id: String,

        /// Use a pre-converted text file instead of downloading the PDF
        #[arg(long)]
        text_file: Option<String>,
    },

    /// Fetch summary stats, author counts and quality signals for one repo
    Stats {
        /// Repository as "owner/repo" or a full URL
        repo: String,
    },

    /// Run the full corpus pipeline and write the stats table
    Run {
        /// File with one repository per line ("owner/repo" or URL)
        #[arg(long, conflicts_with = "papers")]
        repos: Option<String>,

        /// File with one "identifier,citation_count" paper per line;
        /// each paper's PDF is downloaded and scanned for mentions
        #[arg(long)]
        papers: Option<String>,

        /// Output CSV path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Marker substring anchoring each mention
        #[arg(short, long, default_value = DEFAULT_MARKER)]
        marker: String,
    },

    /// Check the GraphQL API rate limit
    RateLimit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { file, marker } => extract_from_file(&file, &marker),
        Commands::Arxiv { arxiv_id, text_file } => extract_from_arxiv(&arxiv_id, text_file.as_deref()),
        Commands::Stats { repo } => single_repo_stats(&repo, cli.debug),
        Commands::Run { repos, papers, output, marker } => {
            run_pipeline(repos.as_deref(), papers.as_deref(), output.as_deref(), &marker, cli.debug)
        }
        Commands::RateLimit => check_rate_limit(cli.debug),
    }
}

/// Extract and normalize mentions from an already-converted text file.
fn extract_from_file(path: &str, marker: &str) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let text = PlainTextExtractor.extract_text(&bytes)?;
    for repo in scan_text(&text, marker) {
        println!("{}", repo);
    }
    Ok(())
}

/// Download one paper (or use a pre-converted text file) and list mentions.
fn extract_from_arxiv(arxiv_id: &str, text_file: Option<&str>) -> Result<()> {
    let bytes = match text_file {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read {}", path))?,
        None => {
            eprintln!("\x1b[36m..\x1b[0m Downloading arXiv:{}", arxiv_id);
            let http = Config::http_client()?;
            fetch_pdf(&http, arxiv_id)?
        }
    };
    let text = PlainTextExtractor.extract_text(&bytes)?;
    for repo in scan_text(&text, DEFAULT_MARKER) {
        println!("{}", repo);
    }
    Ok(())
}

/// SpanExtractor + IdentifierNormalizer over one paper's text.
fn scan_text(text: &str, marker: &str) -> BTreeSet<RepoId> {
    let mentions = extract_mentions(text, marker);
    normalize_mentions(mentions.iter().map(String::as_str))
}

/// Full enrichment for one repository: summary query, author pagination for
/// both contribution kinds, then the file-tree probes.
fn enrich_repo(
    client: &GithubClient,
    prober: &HttpProber,
    repo: RepoId,
) -> Result<RepositoryRecord> {
    let summary = summary_stats(client, &repo)?;
    let issue_authors = collect_authors(client, &repo, ContributionKind::Issues)?;
    let pr_authors = collect_authors(client, &repo, ContributionKind::PullRequests)?;
    let signals = probe::probe(prober, &repo);
    Ok(stats::assemble(repo, summary, &issue_authors, &pr_authors, signals))
}

/// Print one repository's record as a single-row table.
fn single_repo_stats(repo_arg: &str, debug: bool) -> Result<()> {
    let repo = RepoId::parse(repo_arg)
        .with_context(|| format!("Not a repository identifier: {}", repo_arg))?;
    let config = Config::load(debug)?;
    let client = GithubClient::new(&config)?;
    let prober = HttpProber::new(Config::http_client()?);

    eprintln!("\x1b[36m..\x1b[0m Fetching stats for {}", repo.full_name());
    let record = enrich_repo(&client, &prober, repo)?;

    let mut out = std::io::stdout().lock();
    report::write_table(&mut out, &[record])?;
    Ok(())
}

/// Resolve the corpus: either a repos file, or a papers file whose PDFs are
/// downloaded and scanned for mentions.
fn load_corpus(
    repos_file: Option<&str>,
    papers_file: Option<&str>,
    marker: &str,
) -> Result<BTreeSet<RepoId>> {
    match (repos_file, papers_file) {
        (Some(path), None) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read repo list {}", path))?;
            Ok(content
                .lines()
                .filter_map(|line| RepoId::parse(line))
                .collect())
        }
        (None, Some(path)) => {
            let papers = FilePaperSource::new(path).search("")?;
            let ids = arxiv_ids(&papers);
            eprintln!("\x1b[36m..\x1b[0m {} arXiv papers to scan", ids.len());

            let http = Config::http_client()?;
            let mut corpus = BTreeSet::new();
            for (arxiv_id, citations) in ids {
                let text = match fetch_pdf(&http, &arxiv_id)
                    .and_then(|bytes| PlainTextExtractor.extract_text(&bytes))
                {
                    Ok(text) => text,
                    Err(e) => {
                        eprintln!("  \x1b[33m⚠\x1b[0m arXiv:{}: {}", arxiv_id, e);
                        continue;
                    }
                };
                let found = scan_text(&text, marker);
                if !found.is_empty() {
                    eprintln!(
                        "  arXiv:{} \x1b[90m+{} repos ({} citations)\x1b[0m",
                        arxiv_id,
                        found.len(),
                        citations
                    );
                }
                corpus.extend(found);
            }
            Ok(corpus)
        }
        _ => anyhow::bail!("Provide exactly one of --repos or --papers"),
    }
}

/// Sequential corpus run: enrich every repository, then write the table.
/// Missing repositories only produce warnings; transport failures abort.
fn run_pipeline(
    repos_file: Option<&str>,
    papers_file: Option<&str>,
    output: Option<&str>,
    marker: &str,
    debug: bool,
) -> Result<()> {
    let config = Config::load(debug)?;
    let client = GithubClient::new(&config)?;
    let prober = HttpProber::new(Config::http_client()?);

    let corpus = load_corpus(repos_file, papers_file, marker)?;
    if corpus.is_empty() {
        eprintln!("\x1b[33m..\x1b[0m No repositories to process");
        return Ok(());
    }
    eprintln!("\x1b[36m..\x1b[0m Enriching {} repositories", corpus.len());

    let mut records = Vec::new();
    for (idx, repo) in corpus.into_iter().enumerate() {
        eprintln!("  [{}] {}", idx + 1, repo.full_name());
        records.push(enrich_repo(&client, &prober, repo)?);
    }

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path))?;
            report::write_table(&mut file, &records)?;
            file.flush()?;
            eprintln!("\x1b[32mok\x1b[0m Wrote {} records to {}", records.len(), path);
        }
        None => {
            let mut out = std::io::stdout().lock();
            report::write_table(&mut out, &records)?;
        }
    }
    Ok(())
}

fn check_rate_limit(debug: bool) -> Result<()> {
    let config = Config::load(debug)?;
    let client = GithubClient::new(&config)?;
    let limit = rate_limit(&client)?;
    println!(
        "GraphQL: {}/{} remaining (cost {}, resets at {})",
        limit.remaining, limit.limit, limit.cost, limit.reset_at
    );
    Ok(())
}
