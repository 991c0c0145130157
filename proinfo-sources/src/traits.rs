//! Common types for intelligence sources

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use proinfo_core::TargetRecord;
use proinfo_net::DnsError;

/// Errors raised inside a source before they are absorbed
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned status: {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider reported failure: {0}")]
    Provider(String),

    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

/// Which provider a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ReverseDns,
    Whois,
    Recon,
    Abuse,
}

impl SourceKind {
    /// Provenance recorded when the source failed or timed out
    pub fn failure_label(&self) -> &'static str {
        match self {
            SourceKind::ReverseDns => "DNS Error",
            SourceKind::Whois => "failed",
            SourceKind::Recon => "InternetDB (failed)",
            SourceKind::Abuse => "AbuseIPDB (failed)",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::ReverseDns => write!(f, "reverse-dns"),
            SourceKind::Whois => write!(f, "whois"),
            SourceKind::Recon => write!(f, "recon"),
            SourceKind::Abuse => write!(f, "abuse"),
        }
    }
}

/// Ownership and location data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoisFinding {
    pub owner: Option<String>,
    pub country: Option<String>,
    pub asn: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Exposure data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconFinding {
    pub ports: Vec<u16>,
    pub vulns: Vec<String>,
    pub hostnames: Vec<String>,
    pub cpes: Vec<String>,
}

/// Reputation data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbuseFinding {
    /// 0-100
    pub confidence: u8,
    pub usage_type: Option<String>,
}

/// Partial result of one source. Each variant owns a disjoint set of record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    ReverseDns { hostname: Option<String> },
    Whois(WhoisFinding),
    Recon(ReconFinding),
    Abuse(AbuseFinding),
}

impl Finding {
    /// Zero value for a source
    pub fn empty(kind: SourceKind) -> Self {
        match kind {
            SourceKind::ReverseDns => Finding::ReverseDns { hostname: None },
            SourceKind::Whois => Finding::Whois(WhoisFinding::default()),
            SourceKind::Recon => Finding::Recon(ReconFinding::default()),
            SourceKind::Abuse => Finding::Abuse(AbuseFinding::default()),
        }
    }

    /// Merge into a record by field name
    pub fn apply_to(self, record: &mut TargetRecord) {
        match self {
            Finding::ReverseDns { hostname } => {
                record.reverse_hostname = hostname;
            }
            Finding::Whois(whois) => {
                record.owner_org = whois.owner;
                record.country_code = whois.country;
                record.asn = whois.asn;
                record.latitude = whois.latitude;
                record.longitude = whois.longitude;
            }
            Finding::Recon(recon) => {
                record.open_ports = recon.ports.into_iter().collect();
                record.vulnerability_ids = recon.vulns;
                record.hostnames = recon.hostnames;
                record.platform_ids = recon.cpes;
            }
            Finding::Abuse(abuse) => {
                record.abuse_confidence = abuse.confidence;
                record.usage_type = abuse.usage_type;
            }
        }
    }
}

/// What a source hands back for one address
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub kind: SourceKind,
    /// Human-readable provenance; `None` when the source was skipped
    pub provenance: Option<String>,
    pub finding: Finding,
}

impl SourceReport {
    pub fn new(kind: SourceKind, provenance: &str, finding: Finding) -> Self {
        Self {
            kind,
            provenance: Some(provenance.to_string()),
            finding,
        }
    }

    /// Empty report for a failed or timed-out source
    pub fn empty(kind: SourceKind) -> Self {
        Self::new(kind, kind.failure_label(), Finding::empty(kind))
    }

    /// Empty report for a source that did not run (e.g. no credential)
    pub fn skipped(kind: SourceKind) -> Self {
        Self {
            kind,
            provenance: None,
            finding: Finding::empty(kind),
        }
    }
}

/// Common interface for all intelligence sources
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Provider name for logs
    fn name(&self) -> &str;

    /// Query the provider for one address. Never fails: errors yield an empty report.
    async fn query(&self, address: &str) -> SourceReport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reports() {
        let report = SourceReport::empty(SourceKind::Whois);
        assert_eq!(report.provenance.as_deref(), Some("failed"));
        assert_eq!(report.finding, Finding::Whois(WhoisFinding::default()));

        let skipped = SourceReport::skipped(SourceKind::Abuse);
        assert!(skipped.provenance.is_none());
    }

    #[test]
    fn test_findings_touch_disjoint_fields() {
        let mut record = TargetRecord::pending("198.51.100.7");

        Finding::Recon(ReconFinding {
            ports: vec![443, 22, 443],
            vulns: vec!["CVE-2023-0001".to_string()],
            hostnames: vec!["edge.example".to_string()],
            cpes: vec!["cpe:/a:openbsd:openssh".to_string()],
        })
        .apply_to(&mut record);

        Finding::Abuse(AbuseFinding {
            confidence: 42,
            usage_type: Some("Data Center/Web Hosting/Transit".to_string()),
        })
        .apply_to(&mut record);

        Finding::ReverseDns {
            hostname: Some("edge.example".to_string()),
        }
        .apply_to(&mut record);

        assert_eq!(record.open_ports.iter().copied().collect::<Vec<_>>(), vec![22, 443]);
        assert_eq!(record.vulnerability_ids, vec!["CVE-2023-0001"]);
        assert_eq!(record.abuse_confidence, 42);
        assert_eq!(record.reverse_hostname.as_deref(), Some("edge.example"));
        assert!(record.owner_org.is_none());
    }
}
