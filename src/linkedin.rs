//! LinkedIn's public "guest" job search.
//!
//! The guest endpoint returns HTML fragments of job cards, 10 or 25 at a
//! time, and needs no login. Postings can optionally be opened one by one
//! to pull the full description.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use regex::Regex;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};

use crate::{
    delays::{DelayRange, random_delay},
    job_search::{JobQuery, JobRecord, JobSearch, JobSite, ScrapeError},
    proxy::Proxy,
    requests::RequestClient,
    text_manipulators::{extract_clean_text, first_text},
};

const SEARCH_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";
const JOB_VIEW_URL: &str = "https://www.linkedin.com/jobs/view";
// The guest API stops paging well before this.
const MAX_START_OFFSET: usize = 1000;
const PAGE_DELAY: DelayRange = DelayRange::new(3, 7);

pub struct LinkedInSearch {
    timeout: Duration,
    search_url: String,
    job_view_url: String,
    parser: JobCardParser,
}

impl LinkedInSearch {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_endpoints(timeout, SEARCH_URL, JOB_VIEW_URL)
    }

    /// Same backend against other hosts, e.g. a regional mirror.
    pub fn with_endpoints(
        timeout: Duration,
        search_url: impl Into<String>,
        job_view_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            timeout,
            search_url: search_url.into(),
            job_view_url: job_view_url.into(),
            parser: JobCardParser::new()?,
        })
    }

    async fn fetch_page(
        &self,
        client: &RequestClient,
        query: &JobQuery,
        start: usize,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let response = client
            .fetch_query_response(&self.search_url, &search_params(query, start))
            .await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScrapeError::RateLimited(
                "blocked by LinkedIn for too many requests".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ScrapeError::Other(format!("LinkedIn responded with {status}")));
        }
        let body = response.text().await?;
        Ok(self.parser.parse_job_cards(&body))
    }

    async fn fetch_description(&self, client: &RequestClient, job_id: &str) -> anyhow::Result<String> {
        let body = client
            .fetch_url_body(&format!("{}/{job_id}", self.job_view_url))
            .await?;
        self.parser
            .parse_description(&body)
            .ok_or_else(|| anyhow!("no description block on job page"))
    }
}

#[async_trait]
impl JobSearch for LinkedInSearch {
    async fn search(&self, query: &JobQuery, proxy: &Proxy) -> Result<Vec<JobRecord>, ScrapeError> {
        let client = RequestClient::through_proxy(proxy, self.timeout)
            .map_err(|e| ScrapeError::Other(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut records = vec![];
        let mut start = 0;
        while records.len() < query.results_wanted && start < MAX_START_OFFSET {
            let cards = match self.fetch_page(&client, query, start).await {
                Ok(cards) => cards,
                // Keep what earlier pages gave us.
                Err(e) if !records.is_empty() => {
                    warn!("LinkedIn paging stopped at offset {start}: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };
            if cards.is_empty() {
                break;
            }
            start += cards.len();
            for card in cards {
                if records.len() < query.results_wanted && seen.insert(card.id.clone()) {
                    records.push(card);
                }
            }
            debug!("LinkedIn: {} postings after offset {start}", records.len());
            if records.len() < query.results_wanted {
                random_delay(PAGE_DELAY, "LinkedIn page").await;
            }
        }

        if query.fetch_description {
            for record in &mut records {
                match self.fetch_description(&client, &record.id).await {
                    Ok(description) => record.description = description,
                    Err(e) => warn!("Could not fetch description for job {}: {e}", record.id),
                }
            }
        }

        info!("LinkedIn returned {} postings through {proxy}", records.len());
        Ok(records)
    }
}

fn search_params(query: &JobQuery, start: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("keywords", query.search_term.clone()),
        ("location", query.location.clone()),
        ("pageNum", "0".to_string()),
        ("start", start.to_string()),
    ];
    if query.hours_old > 0 {
        let seconds_old = u64::from(query.hours_old) * 3600;
        params.push(("f_TPR", format!("r{seconds_old}")));
    }
    params
}

/// Selectors and patterns for LinkedIn's guest markup, compiled once.
pub struct JobCardParser {
    card: Selector,
    title: Selector,
    title_fallback: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
    posted: Selector,
    description: Selector,
    // Posting URLs end in "-<numeric id>".
    job_id: Regex,
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e}"))
}

impl JobCardParser {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            card: selector("div.base-search-card")?,
            title: selector("span.sr-only")?,
            title_fallback: selector("h3.base-search-card__title")?,
            company: selector("h4.base-search-card__subtitle")?,
            location: selector("span.job-search-card__location")?,
            link: selector("a.base-card__full-link")?,
            posted: selector("time[datetime]")?,
            description: selector("div.show-more-less-html__markup")?,
            job_id: Regex::new(r"(\d+)/?$")?,
        })
    }

    pub fn parse_job_cards(&self, html: &str) -> Vec<JobRecord> {
        let document = Html::parse_document(html);
        document
            .select(&self.card)
            .filter_map(|card| self.parse_card(card))
            .collect()
    }

    fn parse_card(&self, card: ElementRef) -> Option<JobRecord> {
        let href = card.select(&self.link).next()?.value().attr("href")?;
        let job_url = href.split('?').next().unwrap_or(href).to_string();
        let id = self.extract_job_id(&job_url).or_else(|| entity_urn_id(card))?;

        let title = first_text(card, &self.title)
            .or_else(|| first_text(card, &self.title_fallback))
            .unwrap_or_default();
        let company = first_text(card, &self.company).unwrap_or_default();
        let location = first_text(card, &self.location).unwrap_or_default();
        let date_posted = card
            .select(&self.posted)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        Some(JobRecord {
            id,
            site: JobSite::LinkedIn,
            title,
            company,
            location,
            job_url,
            date_posted,
            description: String::new(),
        })
    }

    fn extract_job_id(&self, job_url: &str) -> Option<String> {
        let caps = self.job_id.captures(job_url)?;
        Some(caps.get(1)?.as_str().to_string())
    }

    pub fn parse_description(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.description)
            .next()
            .map(extract_clean_text)
            .filter(|text| !text.is_empty())
    }
}

// Some cards carry the id only on the wrapper, e.g. "urn:li:jobPosting:123".
fn entity_urn_id(card: ElementRef) -> Option<String> {
    let urn = card.value().attr("data-entity-urn")?;
    let id = urn.rsplit(':').next()?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}
