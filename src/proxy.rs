use std::fmt;

/// Scheme used to talk to the proxy itself. Listed proxies are plain HTTP
/// forwarders that tunnel TLS with CONNECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyScheme {
    Http,
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyScheme::Http => write!(f, "http"),
        }
    }
}

/// A forwarding endpoint taken from a public proxy list. Nothing beyond the
/// address is known about it; whether it works is only ever a point-in-time
/// answer from the validation probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub scheme: ProxyScheme,
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16, scheme: ProxyScheme) -> Self {
        Self {
            host: host.into(),
            port,
            scheme,
        }
    }

    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, ProxyScheme::Http)
    }

    /// `host:port`, used to spot the same endpoint listed by several sources.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// A reqwest proxy that forwards both plain and TLS traffic through us.
    pub fn to_reqwest(&self) -> reqwest::Result<reqwest::Proxy> {
        reqwest::Proxy::all(self.to_string())
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
