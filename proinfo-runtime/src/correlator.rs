//! Correlator - single-target analysis
//!
//! PENDING → resolve → source fan-out → merge → score → SUCCESS, or ERROR
//! when the target is invalid, unresolvable or the pipeline itself fails.
//! Sources are queried concurrently against the resolved address; each runs
//! on its own task under its own deadline, so a slow, failing or panicking
//! source only blanks its own fields.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use proinfo_core::{TargetKind, TargetRecord};
use proinfo_net::{create_http_client, DnsLookup, DohClient, Resolver};
use proinfo_sources::{build_sources, SharedSource, SourceReport};

use crate::EngineConfig;

/// Reason recorded when the pipeline fails unexpectedly
pub const ANALYSIS_FAILED: &str = "analysis failed";

/// Separator between source provenance labels
pub const ATTRIBUTION_SEPARATOR: &str = " / ";

/// Analyzes one target at a time; cheap to clone across tasks
#[derive(Clone)]
pub struct Correlator {
    resolver: Resolver,
    sources: Arc<Vec<SharedSource>>,
    adapter_timeout: Duration,
}

impl Correlator {
    pub fn new(resolver: Resolver, sources: Vec<SharedSource>, adapter_timeout: Duration) -> Self {
        Self {
            resolver,
            sources: Arc::new(sources),
            adapter_timeout,
        }
    }

    /// Wire the standard DoH resolver and sources from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self, anyhow::Error> {
        let client = create_http_client(&config.http)?;
        let dns: Arc<dyn DnsLookup> =
            Arc::new(DohClient::with_endpoint(client.clone(), &config.endpoints.doh));
        let sources = build_sources(client, dns.clone(), &config.endpoints, &config.credentials);

        Ok(Self::new(Resolver::new(dns), sources, config.adapter_timeout()))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Analyze `target`. Always returns a terminal record.
    pub async fn analyze(&self, target: &str, depth: u32, origin: Option<&str>) -> TargetRecord {
        let pending = TargetRecord::pending_at(target, depth, origin);

        let this = self.clone();
        let record = pending.clone();
        match tokio::spawn(async move { this.run_pipeline(record).await }).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Analysis of {} aborted: {}", target, e);
                pending.fail(ANALYSIS_FAILED)
            }
        }
    }

    async fn run_pipeline(&self, mut record: TargetRecord) -> TargetRecord {
        let resolved = match self.resolver.resolve(&record.identifier).await {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!("{} rejected: {}", record.identifier, e);
                return record.fail(e.to_string());
            }
        };

        let reports = self.query_sources(&resolved.address).await;

        let mut attribution = Vec::with_capacity(reports.len());
        for report in reports {
            if let Some(provenance) = report.provenance {
                attribution.push(provenance);
            }
            report.finding.apply_to(&mut record);
        }

        record.linked_assets = match resolved.kind {
            TargetKind::Domain => vec![resolved.address.clone()],
            TargetKind::Ip => record.reverse_hostname.iter().cloned().collect(),
        };
        record.kind = resolved.kind;
        record.resolved_address = Some(resolved.address);
        record.dns_records = resolved.dns_records;
        record.source_attribution =
            (!attribution.is_empty()).then(|| attribution.join(ATTRIBUTION_SEPARATOR));

        let record = record.succeed();
        debug!(
            "{} scored {} ({})",
            record.identifier, record.threat_score, record.threat_level
        );
        record
    }

    /// Query every source; results come back in registration order
    async fn query_sources(&self, address: &str) -> Vec<SourceReport> {
        let deadline = self.adapter_timeout;

        let calls = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let address = address.to_string();
            async move {
                let kind = source.kind();
                let name = source.name().to_string();
                let task =
                    tokio::spawn(async move { timeout(deadline, source.query(&address)).await });

                match task.await {
                    Ok(Ok(report)) => report,
                    Ok(Err(_)) => {
                        warn!("{} timed out after {:?}", name, deadline);
                        SourceReport::empty(kind)
                    }
                    Err(e) => {
                        warn!("{} aborted: {}", name, e);
                        SourceReport::empty(kind)
                    }
                }
            }
        });

        join_all(calls).await
    }
}
