use std::collections::HashSet;

use log::{info, warn};
use scraper::{Html, Selector};
use thiserror::Error;

use crate::{proxy::Proxy, requests::RequestClient, text_manipulators::extract_clean_text};

pub const DEFAULT_PROXY_SOURCES: [&str; 3] = [
    "https://free-proxy-list.net/",
    "https://www.sslproxies.org/",
    "https://www.us-proxy.org/",
];

// Column layout shared by the free-proxy-list family of sites.
const HOST_COLUMN: usize = 0;
const PORT_COLUMN: usize = 1;
const HTTPS_COLUMN: usize = 6;

#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("request failed: {0}")]
    Request(#[from] anyhow::Error),
    #[error("page has no proxy table")]
    MissingTable,
}

/// Reads the proxy table of a directory page, keeping rows that advertise
/// HTTPS support. Malformed rows are skipped; a page without a table body is
/// an error so the caller can skip the whole source.
pub fn parse_proxy_table(html: &str) -> Result<Vec<Proxy>, SourceFetchError> {
    let document = Html::parse_document(html);
    let tbody_selector = Selector::parse("table tbody").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let Some(tbody) = document.select(&tbody_selector).next() else {
        return Err(SourceFetchError::MissingTable);
    };

    let mut proxies = vec![];
    for row in tbody.select(&row_selector) {
        let cells: Vec<String> = row.select(&cell_selector).map(extract_clean_text).collect();
        if cells.len() <= HTTPS_COLUMN {
            continue;
        }
        // Listings write the flag as a lowercase "yes"; anything else is a no.
        if cells[HTTPS_COLUMN] != "yes" {
            continue;
        }
        let host = &cells[HOST_COLUMN];
        let Ok(port) = cells[PORT_COLUMN].parse::<u16>() else {
            continue;
        };
        if host.is_empty() {
            continue;
        }
        proxies.push(Proxy::http(host.as_str(), port));
    }
    Ok(proxies)
}

async fn fetch_source(client: &RequestClient, url: &str) -> Result<Vec<Proxy>, SourceFetchError> {
    let body = client.fetch_url_body(url).await?;
    parse_proxy_table(&body)
}

/// Collects candidates from every source in order. A failing source is
/// logged and skipped; the result may be empty.
pub async fn fetch_candidate_proxies(client: &RequestClient, sources: &[String]) -> Vec<Proxy> {
    let mut seen = HashSet::new();
    let mut proxies = vec![];
    for url in sources {
        match fetch_source(client, url).await {
            Ok(found) => {
                info!("Fetched {} HTTPS-capable proxies from {url}", found.len());
                proxies.extend(found.into_iter().filter(|proxy| seen.insert(proxy.address())));
            }
            Err(e) => warn!("Error fetching proxies from {url}: {e}"),
        }
    }
    proxies
}
