use log::info;

use crate::{
    config::ScraperConfig,
    job_search::{JobSearch, JobSite},
    linkedin::LinkedInSearch,
    output::CsvSink,
    proxy_sources::fetch_candidate_proxies,
    requests::RequestClient,
    scrape_loop::{self, RunReport},
    validation::{HttpProbe, select_working},
};

pub struct ScrapingContext {
    pub scraping_config: ScraperConfig,
    pub request_client: RequestClient,
    pub probe: HttpProbe,
    pub search: Box<dyn JobSearch + Send + Sync>,
}

impl ScrapingContext {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_config(ScraperConfig::new()?)
    }

    pub fn from_config(scraping_config: ScraperConfig) -> anyhow::Result<Self> {
        let request_client = RequestClient::new(scraping_config.request_timeout)?;
        let probe = HttpProbe::new(
            scraping_config.validation_url.clone(),
            scraping_config.validation_timeout,
        );
        let search = search_for_site(scraping_config.query.site, &scraping_config)?;
        Ok(ScrapingContext {
            scraping_config,
            request_client,
            probe,
            search,
        })
    }

    /// Acquire, validate, then scrape. Fails with `RunError::EmptyPool` when
    /// no proxy survives validation; the output file is left untouched then.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        let config = &self.scraping_config;
        let candidates = fetch_candidate_proxies(&self.request_client, &config.proxy_sources).await;
        info!("Fetched {} proxies.", candidates.len());

        let working = select_working(&self.probe, &candidates, config.results_wanted).await;
        info!("Found {} working proxies.", working.len());

        let mut sink = CsvSink::new(&config.output_path);
        let report = scrape_loop::run(
            working,
            self.search.as_ref(),
            &config.query,
            &mut sink,
            config.retry.clone(),
        )
        .await?;
        Ok(report)
    }
}

fn search_for_site(
    site: JobSite,
    config: &ScraperConfig,
) -> anyhow::Result<Box<dyn JobSearch + Send + Sync>> {
    match site {
        JobSite::LinkedIn => Ok(Box::new(LinkedInSearch::new(config.request_timeout)?)),
    }
}
