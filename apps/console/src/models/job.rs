use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job record discovered by the scraper, awaiting moderation before it
/// becomes visible to end users. Wire names follow the backend's payloads.
///
/// Lifecycle: pending until approved (published) or rejected (deleted); both
/// transitions are terminal and remove the job from the pending working set.
/// `id` is immutable and is the sole key for selection and reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftJob {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "originalLink", default)]
    pub original_link: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One historical execution record of a scraping job. Append-only; the
/// moderation workflow never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    #[serde(rename = "_id")]
    pub id: String,
    pub source: String,
    pub status: ScrapeStatus,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "jobsFound", default)]
    pub jobs_found: u32,
    #[serde(rename = "jobsInserted", default)]
    pub jobs_inserted: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Running,
    Completed,
    Failed,
}

impl ScrapeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScrapeStatus::Running => "running",
            ScrapeStatus::Completed => "completed",
            ScrapeStatus::Failed => "failed",
        }
    }
}

/// Scrape trigger targets, with the backend's wire values. `All` fans the
/// run out to every configured source server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeSource {
    MarocAnnonce,
    Rekrute,
    All,
}

impl ScrapeSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScrapeSource::MarocAnnonce => "maroc-annonce",
            ScrapeSource::Rekrute => "rekrute",
            ScrapeSource::All => "all",
        }
    }
}

impl fmt::Display for ScrapeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maroc-annonce" => Ok(ScrapeSource::MarocAnnonce),
            "rekrute" => Ok(ScrapeSource::Rekrute),
            "all" => Ok(ScrapeSource::All),
            other => Err(format!(
                "unknown scrape source '{other}' (expected maroc-annonce, rekrute, or all)"
            )),
        }
    }
}

/// Response from the scrape trigger endpoint: a human-readable status line,
/// stored for display.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerReceipt {
    #[serde(default)]
    pub message: String,
}
