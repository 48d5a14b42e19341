use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on matching-skill labels surfaced per match.
pub const MAX_SKILLS_SHOWN: usize = 6;

/// One entry of a match result: a job summary plus similarity metadata.
///
/// Every field is optional on the wire; a sparse or filler entry must never
/// fail deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMatch {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "companyName")]
    pub company_name: Option<String>,
    pub company: Option<CompanyRef>,
    pub location: Option<String>,
    /// Similarity to the uploaded CV in [0, 100]; absent on filler entries.
    #[serde(rename = "similarityScore")]
    pub similarity_score: Option<f64>,
    #[serde(rename = "matchingSkills")]
    pub matching_skills: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Nested company reference some payloads carry instead of `companyName`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRef {
    pub name: Option<String>,
}

impl JobMatch {
    /// Company display name: the denormalized field first, then the nested
    /// company object.
    pub fn company_display(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .or_else(|| self.company.as_ref().and_then(|c| c.name.as_deref()))
    }

    /// Skill labels capped for display.
    pub fn skills_shown(&self) -> &[String] {
        &self.matching_skills[..self.matching_skills.len().min(MAX_SKILLS_SHOWN)]
    }
}

/// Normalized outcome of a CV-to-job retrieval.
///
/// Invariants enforced by [`crate::matching::normalize`]:
/// `semantic_count <= matches.len()` and
/// `fallback == (semantic_count < matches.len())`. Constructed fresh per
/// request and superseded wholesale by the next one.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub matches: Vec<JobMatch>,
    /// Server-reported candidate total; defaults to `matches.len()`.
    pub total: usize,
    /// How many entries are true personalized matches.
    pub semantic_count: usize,
    /// True when any non-personalized filler entry is present.
    pub fallback: bool,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self {
            matches: Vec::new(),
            total: 0,
            semantic_count: 0,
            fallback: false,
        }
    }

    pub fn filler_count(&self) -> usize {
        self.matches.len() - self.semantic_count
    }

    /// Presentation policy derived from the fallback signals.
    pub fn personalization(&self) -> Personalization {
        if !self.fallback {
            Personalization::Full
        } else if self.semantic_count == 0 {
            Personalization::NonPersonalized
        } else {
            Personalization::Mixed {
                semantic_count: self.semantic_count,
            }
        }
    }
}

/// How personalized a match result is, driving the operator-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Personalization {
    /// Every entry is a semantic match for the uploaded CV.
    Full,
    /// The first `semantic_count` entries are semantic; the rest are recent
    /// listings padded in because too few semantic matches exist.
    Mixed { semantic_count: usize },
    /// No semantic matches at all; every entry is a recent listing.
    NonPersonalized,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(matches: usize, semantic: usize) -> MatchResult {
        MatchResult {
            matches: vec![JobMatch::default(); matches],
            total: matches,
            semantic_count: semantic,
            fallback: semantic < matches,
        }
    }

    #[test]
    fn personalization_full_when_no_filler() {
        assert_eq!(result(3, 3).personalization(), Personalization::Full);
        assert_eq!(result(0, 0).personalization(), Personalization::Full);
    }

    #[test]
    fn personalization_mixed_reports_semantic_count() {
        assert_eq!(
            result(5, 2).personalization(),
            Personalization::Mixed { semantic_count: 2 }
        );
        assert_eq!(result(5, 2).filler_count(), 3);
    }

    #[test]
    fn personalization_none_when_every_entry_is_filler() {
        assert_eq!(result(4, 0).personalization(), Personalization::NonPersonalized);
    }

    #[test]
    fn job_match_accepts_either_id_spelling() {
        let a: JobMatch = serde_json::from_value(serde_json::json!({ "_id": "x" })).unwrap();
        let b: JobMatch = serde_json::from_value(serde_json::json!({ "id": "y" })).unwrap();
        assert_eq!(a.id.as_deref(), Some("x"));
        assert_eq!(b.id.as_deref(), Some("y"));
    }

    #[test]
    fn company_display_prefers_denormalized_name() {
        let m: JobMatch = serde_json::from_value(serde_json::json!({
            "companyName": "Acme",
            "company": { "name": "Nested Inc" }
        }))
        .unwrap();
        assert_eq!(m.company_display(), Some("Acme"));

        let nested: JobMatch =
            serde_json::from_value(serde_json::json!({ "company": { "name": "Nested Inc" } }))
                .unwrap();
        assert_eq!(nested.company_display(), Some("Nested Inc"));
    }

    #[test]
    fn skills_shown_is_bounded() {
        let m = JobMatch {
            matching_skills: (0..10).map(|i| format!("skill-{i}")).collect(),
            ..JobMatch::default()
        };
        assert_eq!(m.skills_shown().len(), MAX_SKILLS_SHOWN);
    }
}
