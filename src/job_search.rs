use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proxy::Proxy;

/// Marker a rate-limited response leaves in an otherwise untyped error.
const RATE_LIMIT_MARKER: &str = "429";

pub const NO_JOBS_FOUND: &str = "No jobs found, possibly blocked or rate-limited.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSite {
    LinkedIn,
}

impl fmt::Display for JobSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSite::LinkedIn => write!(f, "linkedin"),
        }
    }
}

/// Parameters for one job search. The proxy is supplied per call since it
/// changes as the pool rotates.
#[derive(Debug, Clone)]
pub struct JobQuery {
    pub site: JobSite,
    pub search_term: String,
    /// Free-text phrase for sites searched through Google.
    pub google_search_term: String,
    pub location: String,
    pub results_wanted: usize,
    pub hours_old: u32,
    /// Country for sites that scope searches by country.
    pub country: String,
    pub fetch_description: bool,
}

/// One posting as returned by a job site. Only counted and written out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub site: JobSite,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_url: String,
    pub date_posted: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("429 Too Many Requests: {0}")]
    RateLimited(String),
    #[error("request timed out")]
    TimedOut,
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScrapeError::TimedOut
        } else if e.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
            ScrapeError::RateLimited(e.to_string())
        } else {
            ScrapeError::Other(e.to_string())
        }
    }
}

#[async_trait]
pub trait JobSearch {
    async fn search(&self, query: &JobQuery, proxy: &Proxy) -> Result<Vec<JobRecord>, ScrapeError>;
}

/// What the retry loop does next is decided by this alone.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Success(Vec<JobRecord>),
    RateLimited(String),
    TimedOut,
    OtherError(String),
}

impl ScrapeOutcome {
    /// Typed errors are taken at their word. An untyped error is only
    /// treated as rate limiting when its message carries a 429. An empty
    /// result set counts as an untyped failure: the site most likely served
    /// a block page rather than a real empty search.
    pub fn classify(result: Result<Vec<JobRecord>, ScrapeError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => ScrapeOutcome::OtherError(NO_JOBS_FOUND.to_string()),
            Ok(records) => ScrapeOutcome::Success(records),
            Err(ScrapeError::RateLimited(detail)) => ScrapeOutcome::RateLimited(detail),
            Err(ScrapeError::TimedOut) => ScrapeOutcome::TimedOut,
            Err(ScrapeError::Other(detail)) if detail.contains(RATE_LIMIT_MARKER) => {
                ScrapeOutcome::RateLimited(detail)
            }
            Err(ScrapeError::Other(detail)) => ScrapeOutcome::OtherError(detail),
        }
    }

    /// Rate limiting and timeouts are blamed on the proxy.
    pub fn should_rotate(&self) -> bool {
        matches!(self, ScrapeOutcome::RateLimited(_) | ScrapeOutcome::TimedOut)
    }
}

impl fmt::Display for ScrapeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeOutcome::Success(records) => write!(f, "{} jobs", records.len()),
            ScrapeOutcome::RateLimited(detail) => write!(f, "rate limited ({detail})"),
            ScrapeOutcome::TimedOut => write!(f, "timed out"),
            ScrapeOutcome::OtherError(detail) => write!(f, "{detail}"),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        site: JobSite::LinkedIn,
        title: "Software Engineer".to_string(),
        company: "Acme".to_string(),
        location: "San Francisco, CA".to_string(),
        job_url: format!("https://www.linkedin.com/jobs/view/{id}"),
        date_posted: "2026-10-16".to_string(),
        description: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_display() {
        assert_eq!(JobSite::LinkedIn.to_string(), "linkedin");
    }

    #[test]
    fn test_classify_success() {
        let outcome = ScrapeOutcome::classify(Ok(vec![sample_record("1"), sample_record("2")]));
        assert!(matches!(&outcome, ScrapeOutcome::Success(records) if records.len() == 2));
        assert!(!outcome.should_rotate());
    }

    #[test]
    fn test_classify_empty_result_as_other_error() {
        let outcome = ScrapeOutcome::classify(Ok(vec![]));
        assert_eq!(outcome, ScrapeOutcome::OtherError(NO_JOBS_FOUND.to_string()));
        assert!(!outcome.should_rotate());
    }

    #[test]
    fn test_classify_typed_errors() {
        let limited = ScrapeOutcome::classify(Err(ScrapeError::RateLimited("slow down".into())));
        assert!(limited.should_rotate());
        let timed_out = ScrapeOutcome::classify(Err(ScrapeError::TimedOut));
        assert_eq!(timed_out, ScrapeOutcome::TimedOut);
        assert!(timed_out.should_rotate());
    }

    #[test]
    fn test_classify_untyped_errors_by_message() {
        let limited = ScrapeOutcome::classify(Err(ScrapeError::Other(
            "HTTP status client error (429 Too Many Requests)".into(),
        )));
        assert!(matches!(limited, ScrapeOutcome::RateLimited(_)));

        let other = ScrapeOutcome::classify(Err(ScrapeError::Other("connection reset".into())));
        assert_eq!(other, ScrapeOutcome::OtherError("connection reset".into()));
        assert!(!other.should_rotate());
    }

    #[test]
    fn test_outcome_display_names_the_failure() {
        assert_eq!(ScrapeOutcome::TimedOut.to_string(), "timed out");
        assert_eq!(
            ScrapeOutcome::RateLimited("blocked".into()).to_string(),
            "rate limited (blocked)"
        );
        assert_eq!(ScrapeOutcome::OtherError(NO_JOBS_FOUND.into()).to_string(), NO_JOBS_FOUND);
    }

    #[test]
    fn test_rate_limited_display_carries_marker() {
        let e = ScrapeError::RateLimited("blocked".into());
        assert!(e.to_string().contains(RATE_LIMIT_MARKER));
    }
}
