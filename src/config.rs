use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, ensure};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    delays::DelayRange,
    job_search::{JobQuery, JobSite},
    proxy_sources::DEFAULT_PROXY_SOURCES,
    scrape_loop::{ExhaustionPolicy, RetryPolicy},
    validation::{DEFAULT_VALIDATION_TIMEOUT, DEFAULT_VALIDATION_URL},
};

/// The env vars that tune a run. Every one of them is optional.
#[derive(Debug, Deserialize)]
pub struct ScraperEnv {
    #[serde(default = "default_results_wanted")]
    results_wanted: usize,
    #[serde(default = "default_results_per_query")]
    results_per_query: usize,
    #[serde(default = "default_site")]
    site: JobSite,
    #[serde(default = "default_search_term")]
    search_term: String,
    #[serde(default = "default_google_search_term")]
    google_search_term: String,
    #[serde(default = "default_location")]
    location: String,
    #[serde(default = "default_hours_old")]
    hours_old: u32,
    #[serde(default = "default_country")]
    country: String,
    #[serde(default = "default_true")]
    fetch_description: bool,
    #[serde(default = "default_proxy_sources")]
    proxy_sources: Vec<String>,
    #[serde(default = "default_validation_url")]
    validation_url: String,
    #[serde(default = "default_validation_timeout_secs")]
    validation_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_jitter_min_secs")]
    jitter_min_secs: u64,
    #[serde(default = "default_jitter_max_secs")]
    jitter_max_secs: u64,
    #[serde(default = "default_backoff_secs")]
    backoff_secs: u64,
    #[serde(default = "default_max_same_proxy_retries")]
    max_same_proxy_retries: usize,
    #[serde(default)]
    exhaustion_policy: ExhaustionPolicy,
    #[serde(default = "default_output_path")]
    output_path: PathBuf,
}

fn default_results_wanted() -> usize {
    10
}
fn default_results_per_query() -> usize {
    10
}
fn default_site() -> JobSite {
    JobSite::LinkedIn
}
fn default_search_term() -> String {
    "software engineer".to_string()
}
fn default_google_search_term() -> String {
    "software engineer jobs near San Francisco, CA since yesterday".to_string()
}
fn default_location() -> String {
    "San Francisco, CA".to_string()
}
fn default_hours_old() -> u32 {
    72
}
fn default_country() -> String {
    "USA".to_string()
}
fn default_true() -> bool {
    true
}
fn default_proxy_sources() -> Vec<String> {
    DEFAULT_PROXY_SOURCES.iter().map(|s| s.to_string()).collect()
}
fn default_validation_url() -> String {
    DEFAULT_VALIDATION_URL.to_string()
}
fn default_validation_timeout_secs() -> u64 {
    DEFAULT_VALIDATION_TIMEOUT.as_secs()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_jitter_min_secs() -> u64 {
    5
}
fn default_jitter_max_secs() -> u64 {
    15
}
fn default_backoff_secs() -> u64 {
    10
}
fn default_max_same_proxy_retries() -> usize {
    3
}
fn default_output_path() -> PathBuf {
    PathBuf::from("jobs.csv")
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Batches to scrape; also how many working proxies to look for.
    pub results_wanted: usize,
    pub proxy_sources: Vec<String>,
    pub validation_url: String,
    pub validation_timeout: Duration,
    pub request_timeout: Duration,
    pub output_path: PathBuf,
    pub query: JobQuery,
    pub retry: RetryPolicy,
}

impl ScraperConfig {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_env(ScraperEnv::load_from_env()?)
    }

    pub fn from_env(env: ScraperEnv) -> anyhow::Result<Self> {
        ensure!(env.results_wanted > 0, "RESULTS_WANTED must be at least 1");
        ensure!(env.results_per_query > 0, "RESULTS_PER_QUERY must be at least 1");
        ensure!(
            env.max_same_proxy_retries > 0,
            "MAX_SAME_PROXY_RETRIES must be at least 1"
        );
        ensure!(
            env.jitter_min_secs <= env.jitter_max_secs,
            "JITTER_MIN_SECS ({}) is greater than JITTER_MAX_SECS ({})",
            env.jitter_min_secs,
            env.jitter_max_secs
        );
        let proxy_sources: Vec<String> = env
            .proxy_sources
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        ensure!(!proxy_sources.is_empty(), "PROXY_SOURCES is empty");

        Ok(Self {
            results_wanted: env.results_wanted,
            proxy_sources,
            validation_url: env.validation_url,
            validation_timeout: Duration::from_secs(env.validation_timeout_secs),
            request_timeout: Duration::from_secs(env.request_timeout_secs),
            output_path: env.output_path,
            query: JobQuery {
                site: env.site,
                search_term: env.search_term,
                google_search_term: env.google_search_term,
                location: env.location,
                results_wanted: env.results_per_query,
                hours_old: env.hours_old,
                country: env.country,
                fetch_description: env.fetch_description,
            },
            retry: RetryPolicy {
                batches_wanted: env.results_wanted,
                jitter: DelayRange::new(env.jitter_min_secs, env.jitter_max_secs),
                backoff: Duration::from_secs(env.backoff_secs),
                max_same_proxy_retries: env.max_same_proxy_retries,
                exhaustion: env.exhaustion_policy,
            },
        })
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
