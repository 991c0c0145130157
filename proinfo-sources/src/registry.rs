//! Source registration
//!
//! Registration order is the order provenance labels are joined in.

use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use proinfo_net::DnsLookup;

use crate::{
    AbuseSource, Credentials, ReconSource, ReverseDnsSource, SourceAdapter, SourceEndpoints,
    WhoisSource,
};

pub type SharedSource = Arc<dyn SourceAdapter>;

/// Build the standard source set: reverse DNS, WHOIS/geo, recon, abuse
pub fn build_sources(
    client: Client,
    dns: Arc<dyn DnsLookup>,
    endpoints: &SourceEndpoints,
    credentials: &Credentials,
) -> Vec<SharedSource> {
    let abuse = AbuseSource::new(
        client.clone(),
        &endpoints.abuseipdb,
        credentials.abuseipdb_key.clone(),
    );
    if !abuse.has_key() {
        info!("AbuseIPDB key not configured; abuse reputation will be skipped");
    }

    vec![
        Arc::new(ReverseDnsSource::new(dns)),
        Arc::new(WhoisSource::new(
            client.clone(),
            &endpoints.ipwhois,
            credentials.ipwhois_key.clone(),
        )),
        Arc::new(ReconSource::new(client, &endpoints.internetdb)),
        Arc::new(abuse),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;
    use proinfo_net::DohClient;

    #[test]
    fn test_registration_order() {
        let client = Client::new();
        let dns = Arc::new(DohClient::new(client.clone()));
        let sources = build_sources(client, dns, &SourceEndpoints::default(), &Credentials::default());

        let kinds: Vec<SourceKind> = sources.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SourceKind::ReverseDns,
                SourceKind::Whois,
                SourceKind::Recon,
                SourceKind::Abuse
            ]
        );
        assert_eq!(sources[1].name(), "ipwho.is");
    }
}
