use super::{domain_label, is_valid_label, normalize_tld};
use async_trait::async_trait;
use brand_core::{DomainChecker, DomainStatus, Result};
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

const WHOIS_PORT: u16 = 43;
const MAX_RESPONSE_BYTES: u64 = 64 * 1024;

/// Phrases registries use for an unregistered domain.
const AVAILABLE_MARKERS: [&str; 7] = [
    "no match",
    "not found",
    "no data found",
    "domain not found",
    "no entries found",
    "is free",
    "status: available",
];

/// Fields only present in a registration record.
const TAKEN_MARKERS: [&str; 5] =
    ["domain name:", "registrar:", "creation date:", "created:", "registry domain id:"];

pub fn default_whois_server(tld: &str) -> Option<&'static str> {
    match normalize_tld(tld).as_str() {
        ".com" | ".net" => Some("whois.verisign-grs.com"),
        ".ai" => Some("whois.nic.ai"),
        ".io" => Some("whois.nic.io"),
        ".co" => Some("whois.nic.co"),
        ".app" => Some("whois.nic.google"),
        ".me" => Some("whois.nic.me"),
        ".so" => Some("whois.nic.so"),
        ".is" => Some("whois.isnic.is"),
        ".to" => Some("whois.tonic.to"),
        ".org" => Some("whois.pir.org"),
        _ => None,
    }
}

/// Reads a raw WHOIS reply. Anything not clearly free or clearly registered is `Unknown`.
pub fn classify_whois_response(response: &str) -> DomainStatus {
    let lower = response.to_lowercase();
    if AVAILABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        DomainStatus::Available
    } else if TAKEN_MARKERS.iter().any(|m| lower.contains(m)) {
        DomainStatus::Taken
    } else {
        DomainStatus::Unknown
    }
}

/// Port-43 WHOIS client. Lookup failures map to `Unknown`, never to a guess.
#[derive(Debug, Clone)]
pub struct WhoisDomainChecker {
    timeout: Duration,
    overrides: HashMap<String, String>,
}

impl Default for WhoisDomainChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisDomainChecker {
    pub fn new() -> Self {
        Self { timeout: Duration::from_secs(4), overrides: HashMap::new() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Routes a TLD to `host` or `host:port`.
    pub fn with_server(mut self, tld: &str, address: impl Into<String>) -> Self {
        self.overrides.insert(normalize_tld(tld), address.into());
        self
    }

    fn server_for(&self, tld: &str) -> Option<String> {
        if let Some(address) = self.overrides.get(tld) {
            return Some(address.clone());
        }
        default_whois_server(tld).map(|host| format!("{}:{}", host, WHOIS_PORT))
    }

    async fn query(&self, server: &str, domain: &str) -> std::io::Result<String> {
        let mut stream = TcpStream::connect(server).await?;
        stream.write_all(format!("{}\r\n", domain).as_bytes()).await?;
        let mut buf = Vec::new();
        stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    async fn lookup(&self, label: &str, tld: &str) -> DomainStatus {
        let domain = format!("{}{}", label, tld);
        let Some(server) = self.server_for(tld) else {
            debug!(domain = %domain, "no WHOIS server known for TLD");
            return DomainStatus::Unknown;
        };
        match timeout(self.timeout, self.query(&server, &domain)).await {
            Ok(Ok(response)) => {
                let status = classify_whois_response(&response);
                debug!(domain = %domain, ?status, "WHOIS lookup complete");
                status
            }
            Ok(Err(e)) => {
                warn!(domain = %domain, server = %server, error = %e, "WHOIS lookup failed");
                DomainStatus::Unknown
            }
            Err(_) => {
                warn!(domain = %domain, server = %server, "WHOIS lookup timed out");
                DomainStatus::Unknown
            }
        }
    }
}

#[async_trait]
impl DomainChecker for WhoisDomainChecker {
    async fn check_domains(
        &self,
        name: &str,
        tlds: &[String],
    ) -> Result<BTreeMap<String, DomainStatus>> {
        let label = domain_label(name);
        let tlds: Vec<String> = tlds.iter().map(|t| normalize_tld(t)).collect();
        if !is_valid_label(&label) {
            debug!(name = %name, label = %label, "name has no valid hostname label");
            return Ok(tlds.into_iter().map(|tld| (tld, DomainStatus::Unknown)).collect());
        }
        let lookups = tlds.iter().map(|tld| {
            let label = label.as_str();
            async move { (tld.clone(), self.lookup(label, tld).await) }
        });
        Ok(join_all(lookups).await.into_iter().collect())
    }
}
