//! Command-line surface driving the moderation and match workflows.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::Config;
use crate::errors::ApiError;
use crate::gateway::ApiClient;
use crate::matching::{CvUpload, HttpMatchTransport, MatchService, DEFAULT_MATCH_LIMIT};
use crate::models::job::{DraftJob, ScrapeRun, ScrapeSource};
use crate::models::matching::{MatchResult, Personalization};
use crate::moderation::api::HttpScrapingApi;
use crate::moderation::store::{BulkAction, ModerationStore};
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "console",
    about = "Moderation and CV-match console for the job marketplace backend",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a scrape run for one source, or "all"
    Scrape {
        #[arg(value_parser = parse_source)]
        source: ScrapeSource,
    },
    /// Show the scrape run history
    History,
    /// List draft jobs awaiting review
    Jobs,
    /// Approve and publish one draft job
    Approve { id: String },
    /// Reject and delete one draft job
    Reject { id: String },
    /// Approve draft jobs in one batch
    BulkApprove {
        /// Ids to approve; omit and pass --all to take every pending job
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        ids: Vec<String>,
        /// Approve every currently pending draft job
        #[arg(long)]
        all: bool,
    },
    /// Reject draft jobs in one batch
    BulkReject {
        /// Ids to reject; omit and pass --all to take every pending job
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        ids: Vec<String>,
        /// Reject every currently pending draft job
        #[arg(long)]
        all: bool,
    },
    /// Upload a CV and print matching jobs
    Match {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_MATCH_LIMIT)]
        limit: usize,
    },
    /// Print matches for the last uploaded CV
    Matches {
        #[arg(long, default_value_t = DEFAULT_MATCH_LIMIT)]
        limit: usize,
    },
}

fn parse_source(s: &str) -> Result<ScrapeSource, String> {
    s.parse()
}

pub async fn run(cli: Cli, config: &Config, session: &Session) -> anyhow::Result<()> {
    let gateway = ApiClient::new(&config.api_base_url);

    match cli.command {
        Command::Scrape { source } => {
            let store = moderation_store(gateway, session);
            let message = store.trigger_scrape(source).await?;
            println!("{message}");
        }
        Command::History => {
            let store = moderation_store(gateway, session);
            store.fetch_history().await?;
            print_history(&store.snapshot().history);
        }
        Command::Jobs => {
            let store = moderation_store(gateway, session);
            store.fetch_pending().await?;
            print_jobs(&store.snapshot().pending);
        }
        Command::Approve { id } => {
            let store = moderation_store(gateway, session);
            store.approve(&id).await?;
            println!("Approved and published {id}.");
        }
        Command::Reject { id } => {
            let store = moderation_store(gateway, session);
            store.reject(&id).await?;
            println!("Rejected and deleted {id}.");
        }
        Command::BulkApprove { ids, all } => {
            let store = moderation_store(gateway, session);
            let count = run_bulk(&store, BulkAction::Approve, ids, all).await?;
            println!("Approved and published {count} job(s).");
            print_jobs(&store.snapshot().pending);
        }
        Command::BulkReject { ids, all } => {
            let store = moderation_store(gateway, session);
            let count = run_bulk(&store, BulkAction::Reject, ids, all).await?;
            println!("Rejected and deleted {count} job(s).");
            print_jobs(&store.snapshot().pending);
        }
        Command::Match { file, limit } => {
            let service = MatchService::new(HttpMatchTransport::new(gateway, session.clone()));
            let upload = read_cv(&file)?;
            let result = service.upload_and_match(&upload, limit).await?;
            print_matches(&result);
        }
        Command::Matches { limit } => {
            let service = MatchService::new(HttpMatchTransport::new(gateway, session.clone()));
            let result = service.saved_matches(limit).await?;
            print_matches(&result);
        }
    }

    Ok(())
}

fn moderation_store(gateway: ApiClient, session: &Session) -> ModerationStore<HttpScrapingApi> {
    ModerationStore::new(HttpScrapingApi::new(gateway, session.clone()))
}

async fn run_bulk(
    store: &ModerationStore<HttpScrapingApi>,
    action: BulkAction,
    ids: Vec<String>,
    all: bool,
) -> Result<usize, ApiError> {
    if all {
        store.fetch_pending().await?;
        store.select_all();
        let selected = store.selected_ids();
        debug!(
            count = selected.len(),
            all = store.is_all_selected(),
            "selection prepared for batch"
        );
        store.apply_to_selection(action).await?;
        Ok(selected.len())
    } else {
        let count = ids.len();
        match action {
            BulkAction::Approve => store.bulk_approve(&ids).await?,
            BulkAction::Reject => store.bulk_reject(&ids).await?,
        }
        Ok(count)
    }
}

fn read_cv(path: &Path) -> anyhow::Result<CvUpload> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read CV file {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cv")
        .to_string();
    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(CvUpload {
        file_name,
        content_type,
        bytes,
    })
}

fn print_jobs(jobs: &[DraftJob]) {
    if jobs.is_empty() {
        println!("No draft jobs awaiting review.");
        return;
    }
    println!("{} draft job(s) awaiting review:", jobs.len());
    for job in jobs {
        let source = job.source.as_deref().unwrap_or("-");
        let location = job.location.as_deref().unwrap_or("-");
        println!("  {}  {}  [{source}, {location}]", job.id, job.title);
        if let Some(link) = &job.original_link {
            println!("      {link}");
        }
        if let Some(discovered) = job.created_at {
            println!("      discovered {}", discovered.format("%Y-%m-%d %H:%M"));
        }
    }
}

fn print_history(runs: &[ScrapeRun]) {
    if runs.is_empty() {
        println!("No scrape runs recorded.");
        return;
    }
    for run in runs {
        let started = run
            .start_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {started}  {:<14} {:<10} found {:>3} / inserted {:>3}",
            run.source,
            run.status.label(),
            run.jobs_found,
            run.jobs_inserted
        );
    }
}

fn print_matches(result: &MatchResult) {
    match result.personalization() {
        Personalization::Full => {}
        Personalization::Mixed { semantic_count } => println!(
            "Showing {semantic_count} personalized match(es) and {} recent listing(s).",
            result.filler_count()
        ),
        Personalization::NonPersonalized => {
            println!("No personalized matches for this CV; showing recent listings instead.")
        }
    }

    if result.matches.is_empty() {
        println!("No matching jobs found. Try a different CV or check back later.");
        return;
    }

    println!("Matched jobs ({}):", result.matches.len());
    for m in &result.matches {
        let title = m.title.as_deref().unwrap_or("(untitled)");
        let score = m
            .similarity_score
            .map(|s| format!("{s:.0}% match"))
            .unwrap_or_else(|| "-".to_string());
        println!("  {title}  [{score}]");
        if let Some(company) = m.company_display() {
            println!("      {company}");
        }
        if let Some(location) = &m.location {
            println!("      {location}");
        }
        if !m.matching_skills.is_empty() {
            let shown = m.skills_shown();
            let extra = m.matching_skills.len() - shown.len();
            let mut line = format!("      skills: {}", shown.join(", "));
            if extra > 0 {
                line.push_str(&format!(" (+{extra})"));
            }
            println!("{line}");
        }
        if let Some(posted) = m.created_at {
            println!("      posted {}", posted.format("%Y-%m-%d"));
        }
        if let Some(id) = &m.id {
            println!("      id {id}");
        }
    }

    if result.total > result.matches.len() {
        println!("{} candidate(s) total server-side.", result.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_cv_guesses_the_content_type_from_the_extension() {
        let mut file = tempfile::Builder::new()
            .prefix("cv-fixture")
            .suffix(".pdf")
            .tempfile()
            .unwrap();
        file.write_all(b"%PDF-1.4 fixture").unwrap();

        let upload = read_cv(file.path()).unwrap();
        assert_eq!(upload.content_type, "application/pdf");
        assert_eq!(upload.bytes, b"%PDF-1.4 fixture");
        assert!(upload.file_name.ends_with(".pdf"));
    }

    #[test]
    fn read_cv_docx_maps_to_the_word_mime_type() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let upload = read_cv(file.path()).unwrap();
        assert_eq!(
            upload.content_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn read_cv_missing_file_is_an_error() {
        assert!(read_cv(Path::new("/nonexistent/cv.pdf")).is_err());
    }
}
