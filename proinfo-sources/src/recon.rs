//! Recon source - exposure data from Shodan InternetDB

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Finding, ReconFinding, SourceAdapter, SourceError, SourceKind, SourceReport};

/// Keyless port/vulnerability lookups
pub struct ReconSource {
    client: Client,
    base_url: String,
}

impl ReconSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, address: &str) -> Result<ReconFinding, SourceError> {
        let url = format!("{}/{}", self.base_url, address);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

/// Map an InternetDB status and body to a finding
pub fn interpret_response(status: u16, body: &str) -> Result<ReconFinding, SourceError> {
    match status {
        200..=299 => parse_internetdb(body),
        // never-seen address: no exposure on record
        404 => Ok(ReconFinding::default()),
        _ => Err(SourceError::Status(status)),
    }
}

/// Parse an InternetDB body
pub fn parse_internetdb(body: &str) -> Result<ReconFinding, SourceError> {
    let data: InternetDbResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    Ok(ReconFinding {
        ports: data.ports,
        vulns: data.vulns,
        hostnames: data.hostnames,
        cpes: data.cpes,
    })
}

#[async_trait]
impl SourceAdapter for ReconSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Recon
    }

    fn name(&self) -> &str {
        "InternetDB"
    }

    async fn query(&self, address: &str) -> SourceReport {
        match self.fetch(address).await {
            Ok(finding) => {
                debug!(
                    "InternetDB: {} ports, {} vulns for {}",
                    finding.ports.len(),
                    finding.vulns.len(),
                    address
                );
                SourceReport::new(SourceKind::Recon, "InternetDB", Finding::Recon(finding))
            }
            Err(e) => {
                debug!("InternetDB lookup for {} failed: {}", address, e);
                SourceReport::empty(SourceKind::Recon)
            }
        }
    }
}

// InternetDB response types
#[derive(Debug, Deserialize)]
struct InternetDbResponse {
    #[serde(default)]
    ports: Vec<u16>,
    #[serde(default)]
    vulns: Vec<String>,
    #[serde(default)]
    hostnames: Vec<String>,
    #[serde(default)]
    cpes: Vec<String>,
}
