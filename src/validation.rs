use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};

use crate::{proxy::Proxy, requests::RequestClient};

pub const DEFAULT_VALIDATION_URL: &str = "https://httpbin.org/ip";
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait ProxyProbe {
    /// Whether the proxy answers right now. Never fails: any error means no.
    async fn is_valid(&self, proxy: &Proxy) -> bool;
}

/// Probes a proxy with a single GET to an IP echo service.
pub struct HttpProbe {
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    async fn probe(&self, proxy: &Proxy) -> anyhow::Result<bool> {
        let client = RequestClient::through_proxy(proxy, self.timeout)?;
        let response = client.fetch_url_response(&self.url).await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ProxyProbe for HttpProbe {
    async fn is_valid(&self, proxy: &Proxy) -> bool {
        let valid = match self.probe(proxy).await {
            Ok(valid) => valid,
            Err(e) => {
                debug!("probe through {proxy} failed: {e}");
                false
            }
        };
        if valid {
            info!("Valid proxy: {proxy}");
        } else {
            info!("Invalid proxy: {proxy}");
        }
        valid
    }
}

/// Probes candidates one at a time, in order, and stops as soon as `limit`
/// working proxies have been found.
pub async fn select_working<P>(probe: &P, candidates: &[Proxy], limit: usize) -> Vec<Proxy>
where
    P: ProxyProbe + ?Sized,
{
    let mut working = vec![];
    if limit == 0 {
        return working;
    }
    for proxy in candidates {
        if probe.is_valid(proxy).await {
            working.push(proxy.clone());
            if working.len() >= limit {
                break;
            }
        }
    }
    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Accepts a fixed set of ports and remembers what it was asked about.
    struct FakeProbe {
        valid_ports: HashSet<u16>,
        probed: Mutex<Vec<u16>>,
    }

    impl FakeProbe {
        fn accepting(ports: &[u16]) -> Self {
            Self {
                valid_ports: ports.iter().copied().collect(),
                probed: Mutex::new(vec![]),
            }
        }

        fn probed(&self) -> Vec<u16> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProxyProbe for FakeProbe {
        async fn is_valid(&self, proxy: &Proxy) -> bool {
            self.probed.lock().unwrap().push(proxy.port);
            self.valid_ports.contains(&proxy.port)
        }
    }

    fn candidates(ports: &[u16]) -> Vec<Proxy> {
        ports.iter().map(|port| Proxy::http("10.0.0.1", *port)).collect()
    }

    fn ports(proxies: &[Proxy]) -> Vec<u16> {
        proxies.iter().map(|proxy| proxy.port).collect()
    }

    #[tokio::test]
    async fn test_stops_at_limit_and_keeps_order() {
        let probe = FakeProbe::accepting(&[2, 3, 5, 6]);
        let working = select_working(&probe, &candidates(&[1, 2, 3, 4, 5, 6]), 3).await;
        assert_eq!(ports(&working), vec![2, 3, 5]);
        // Early stop: the sixth candidate is never probed.
        assert_eq!(probe.probed(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_returns_all_valid_when_short() {
        let probe = FakeProbe::accepting(&[4, 1]);
        let working = select_working(&probe, &candidates(&[1, 2, 3, 4]), 10).await;
        assert_eq!(ports(&working), vec![1, 4]);
        assert_eq!(probe.probed(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_zero_limit_probes_nothing() {
        let probe = FakeProbe::accepting(&[1]);
        assert!(select_working(&probe, &candidates(&[1]), 0).await.is_empty());
        assert!(probe.probed().is_empty());
    }

    #[tokio::test]
    async fn test_http_probe_treats_errors_as_invalid() {
        let probe = HttpProbe::new("http://127.0.0.1:1/ip", Duration::from_millis(500));
        assert!(!probe.is_valid(&Proxy::http("127.0.0.1", 1)).await);
    }
}
