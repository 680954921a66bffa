pub mod config;
pub mod delays;
pub mod job_search;
pub mod linkedin;
pub mod output;
pub mod proxy;
pub mod proxy_sources;
pub mod requests;
pub mod rotation;
pub mod scrape_loop;
pub mod scraping_context;
pub mod validation;

mod text_manipulators;

#[cfg(test)]
mod test_support;

pub use config::{LoadFromEnv, ScraperConfig};
pub use job_search::{JobQuery, JobRecord, JobSearch, JobSite, ScrapeError, ScrapeOutcome};
pub use output::{CsvSink, OutputSink};
pub use proxy::{Proxy, ProxyScheme};
pub use rotation::{ProxyPool, RetryBudget};
pub use scrape_loop::{ExhaustionPolicy, RetryPolicy, RunError, RunReport, ScrapeLoop};
pub use scraping_context::ScrapingContext;
pub use validation::{HttpProbe, ProxyProbe};
