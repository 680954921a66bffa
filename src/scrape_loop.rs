//! The scrape-retry loop.
//!
//! Each batch is one job query sent through the pool's current proxy.
//! Successful batches are written out and keep the proxy. Rate limiting and
//! timeouts rotate to the next proxy and spend one unit of the retry budget
//! (twice the pool size); any other failure retries on the same proxy, up to
//! a bound. When the budget runs out it is reset and the cursor is pushed
//! one step further along the cycle.

use std::time::Duration;

use log::{error, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    delays::{DelayRange, fixed_delay, random_delay},
    job_search::{JobQuery, JobSearch, ScrapeOutcome},
    output::OutputSink,
    proxy::Proxy,
    rotation::{ProxyPool, RetryBudget},
};

/// What happens to the batch in flight when the retry budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Give up on the batch and move on to the next one.
    #[default]
    SkipBatch,
    /// Keep retrying the batch with a fresh budget.
    RetryBatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub batches_wanted: usize,
    /// Pause after every written batch.
    pub jitter: DelayRange,
    /// Pause after every failed attempt.
    pub backoff: Duration,
    /// Consecutive non-rotating failures tolerated on one proxy before it is
    /// rotated away anyway.
    pub max_same_proxy_retries: usize,
    pub exhaustion: ExhaustionPolicy,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no working proxies found")]
    EmptyPool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub batches_completed: usize,
    pub batches_abandoned: usize,
    pub records_written: usize,
    pub rotations: usize,
    pub budget_resets: usize,
}

enum BatchResult {
    Written,
    Abandoned,
}

pub struct ScrapeLoop {
    pool: ProxyPool,
    budget: RetryBudget,
    same_proxy_failures: usize,
    policy: RetryPolicy,
    report: RunReport,
}

impl ScrapeLoop {
    pub fn new(proxies: Vec<Proxy>, policy: RetryPolicy) -> Result<Self, RunError> {
        let pool = ProxyPool::new(proxies).ok_or(RunError::EmptyPool)?;
        let budget = RetryBudget::for_pool(&pool);
        Ok(Self {
            pool,
            budget,
            same_proxy_failures: 0,
            policy,
            report: RunReport::default(),
        })
    }

    pub fn current_proxy(&self) -> &Proxy {
        self.pool.current()
    }

    pub fn cursor(&self) -> usize {
        self.pool.position()
    }

    pub fn attempt_count(&self) -> usize {
        self.budget.used()
    }

    pub async fn run<S, O>(&mut self, search: &S, query: &JobQuery, sink: &mut O) -> RunReport
    where
        S: JobSearch + ?Sized,
        O: OutputSink + ?Sized,
    {
        info!(
            "Scraping {} batches through {} proxies (retry budget {})",
            self.policy.batches_wanted,
            self.pool.len(),
            self.budget.limit()
        );
        for batch_index in 0..self.policy.batches_wanted {
            match self.run_batch(batch_index, search, query, sink).await {
                BatchResult::Written => self.report.batches_completed += 1,
                BatchResult::Abandoned => self.report.batches_abandoned += 1,
            }
        }
        info!("Run finished: {:?}", self.report);
        self.report.clone()
    }

    async fn run_batch<S, O>(
        &mut self,
        batch_index: usize,
        search: &S,
        query: &JobQuery,
        sink: &mut O,
    ) -> BatchResult
    where
        S: JobSearch + ?Sized,
        O: OutputSink + ?Sized,
    {
        loop {
            let proxy = self.pool.current().clone();
            info!(
                "Batch {}/{}: querying {} through {proxy}",
                batch_index + 1,
                self.policy.batches_wanted,
                query.site
            );

            let outcome = match ScrapeOutcome::classify(search.search(query, &proxy).await) {
                ScrapeOutcome::Success(records) => {
                    info!("Found {} jobs using proxy {proxy}", records.len());
                    match sink.append(&records) {
                        Ok(()) => {
                            self.report.records_written += records.len();
                            self.same_proxy_failures = 0;
                            random_delay(self.policy.jitter, "jitter").await;
                            return BatchResult::Written;
                        }
                        Err(e) => {
                            error!("Failed to write {} jobs: {e:#}", records.len());
                            ScrapeOutcome::OtherError(e.to_string())
                        }
                    }
                }
                failure => failure,
            };

            self.handle_failure(&proxy, &outcome);
            fixed_delay(self.policy.backoff, "backoff").await;

            if self.budget.is_exhausted() {
                self.reset_cycle();
                if self.policy.exhaustion == ExhaustionPolicy::SkipBatch {
                    warn!("Abandoning batch {} after exhausting the retry budget", batch_index + 1);
                    return BatchResult::Abandoned;
                }
            }
        }
    }

    fn handle_failure(&mut self, proxy: &Proxy, outcome: &ScrapeOutcome) {
        if outcome.should_rotate() {
            warn!("Error with proxy {proxy}: {outcome}. Switching to next proxy.");
            self.rotate();
            return;
        }
        self.same_proxy_failures += 1;
        if self.same_proxy_failures >= self.policy.max_same_proxy_retries {
            warn!(
                "Error with proxy {proxy}: {outcome}. {} failures in a row, switching to next proxy.",
                self.same_proxy_failures
            );
            self.rotate();
        } else {
            warn!("Error with proxy {proxy}: {outcome}. Retrying with the same proxy.");
        }
    }

    fn rotate(&mut self) {
        self.pool.rotate();
        self.budget.record_rotation();
        self.same_proxy_failures = 0;
        self.report.rotations += 1;
    }

    /// The cursor is not sent back to the first proxy; it carries on one
    /// step past where the budget ran out.
    fn reset_cycle(&mut self) {
        self.budget.reset();
        let next = self.pool.rotate();
        self.same_proxy_failures = 0;
        self.report.budget_resets += 1;
        warn!("All proxies used. Resetting the retry budget and moving on to {next}");
    }
}

/// Runs the loop over `proxies`. An empty list is refused before anything is
/// queried or written.
pub async fn run<S, O>(
    proxies: Vec<Proxy>,
    search: &S,
    query: &JobQuery,
    sink: &mut O,
    policy: RetryPolicy,
) -> Result<RunReport, RunError>
where
    S: JobSearch + ?Sized,
    O: OutputSink + ?Sized,
{
    let mut scrape_loop = ScrapeLoop::new(proxies, policy)?;
    Ok(scrape_loop.run(search, query, sink).await)
}
