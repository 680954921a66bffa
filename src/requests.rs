use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};

use crate::proxy::Proxy;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct RequestClient {
    client: Client,
}

impl RequestClient {
    /// Direct client, used for the proxy directory pages.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Self::builder(timeout).build()?;
        Ok(Self { client })
    }

    /// Client whose every request is forwarded through `proxy`.
    pub fn through_proxy(proxy: &Proxy, timeout: Duration) -> anyhow::Result<Self> {
        let client = Self::builder(timeout)
            .proxy(proxy.to_reqwest()?)
            // One-off clients; don't keep idle connections to dead proxies.
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client })
    }

    fn builder(timeout: Duration) -> ClientBuilder {
        ClientBuilder::new()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
    }

    pub async fn fetch_url_response(&self, url: &str) -> reqwest::Result<Response> {
        self.client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await
    }

    pub async fn fetch_query_response(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> reqwest::Result<Response> {
        self.client
            .get(url)
            .query(query)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await
    }

    pub async fn fetch_url_body(&self, url: &str) -> anyhow::Result<String> {
        let response = self.fetch_url_response(url).await?.error_for_status()?;
        let body = response.text().await?;
        Ok(body)
    }
}
