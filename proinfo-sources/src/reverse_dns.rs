//! Reverse DNS source - PTR lookup over DNS-over-HTTPS

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use proinfo_core::reverse_pointer_name;
use proinfo_net::{trim_root_dot, DnsLookup, DnsQueryType};

use crate::{Finding, SourceAdapter, SourceKind, SourceReport};

/// PTR lookup for an IPv4 address
pub struct ReverseDnsSource {
    dns: Arc<dyn DnsLookup>,
    provider: String,
}

impl ReverseDnsSource {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self::with_provider(dns, "Cloudflare DoH")
    }

    /// Use a different provider label in provenance strings
    pub fn with_provider(dns: Arc<dyn DnsLookup>, provider: &str) -> Self {
        Self {
            dns,
            provider: provider.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for ReverseDnsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ReverseDns
    }

    fn name(&self) -> &str {
        &self.provider
    }

    async fn query(&self, address: &str) -> SourceReport {
        let name = reverse_pointer_name(address);

        match self.dns.lookup(&name, DnsQueryType::Ptr).await {
            Ok(answers) => match answers.first() {
                Some(answer) => SourceReport::new(
                    SourceKind::ReverseDns,
                    &self.provider,
                    Finding::ReverseDns {
                        hostname: Some(trim_root_dot(&answer.data).to_string()),
                    },
                ),
                None => SourceReport::new(
                    SourceKind::ReverseDns,
                    &format!("{} (No Data)", self.provider),
                    Finding::ReverseDns { hostname: None },
                ),
            },
            Err(e) => {
                debug!("Reverse DNS for {} failed: {}", address, e);
                SourceReport::empty(SourceKind::ReverseDns)
            }
        }
    }
}
