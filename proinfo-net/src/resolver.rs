//! Target resolution
//!
//! Turns a raw target into the canonical IPv4 address used for every source
//! lookup. Dotted quads pass straight through with no DNS traffic; domains are
//! resolved with concurrent A and MX queries and the first A answer wins.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use proinfo_core::{validate, DnsRecord, TargetError, TargetKind};

use crate::{trim_root_dot, DnsAnswer, DnsLookup, DnsQueryType};

/// Why a target could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid target")]
    InvalidTarget(String),

    #[error("could not resolve domain")]
    Unresolvable(String),
}

impl From<TargetError> for ResolveError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::Invalid { target } => ResolveError::InvalidTarget(target),
        }
    }
}

/// A target with its canonical address
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub kind: TargetKind,
    /// Canonical IPv4 address
    pub address: String,
    /// A/MX answers collected for a domain; empty for an address
    pub dns_records: Vec<DnsRecord>,
}

impl ResolvedTarget {
    pub fn is_address(&self) -> bool {
        self.kind == TargetKind::Ip
    }
}

/// Resolver over a pluggable DNS transport
#[derive(Clone)]
pub struct Resolver {
    dns: Arc<dyn DnsLookup>,
}

impl Resolver {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }

    /// The DNS transport, shared with the reverse-DNS source
    pub fn dns(&self) -> Arc<dyn DnsLookup> {
        self.dns.clone()
    }

    pub async fn resolve(&self, target: &str) -> Result<ResolvedTarget, ResolveError> {
        if validate(target)? == TargetKind::Ip {
            return Ok(ResolvedTarget {
                kind: TargetKind::Ip,
                address: target.to_string(),
                dns_records: Vec::new(),
            });
        }

        let (a_answers, mx_answers) = tokio::join!(
            self.lookup_or_empty(target, DnsQueryType::A),
            self.lookup_or_empty(target, DnsQueryType::Mx),
        );

        let address = a_answers
            .iter()
            .find(|a| a.is_a())
            .map(|a| a.data.clone())
            .ok_or_else(|| ResolveError::Unresolvable(target.to_string()))?;

        let dns_records = a_answers
            .iter()
            .chain(mx_answers.iter())
            .map(|a| DnsRecord::new(&a.type_name(), trim_root_dot(&a.data)))
            .collect();

        debug!("Resolved {} to {}", target, address);

        Ok(ResolvedTarget {
            kind: TargetKind::Domain,
            address,
            dns_records,
        })
    }

    async fn lookup_or_empty(&self, name: &str, query_type: DnsQueryType) -> Vec<DnsAnswer> {
        match self.dns.lookup(name, query_type).await {
            Ok(answers) => answers,
            Err(e) => {
                debug!("{} lookup for {} failed: {}", query_type, name, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DnsError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeDns {
        table: HashMap<(String, DnsQueryType), Vec<DnsAnswer>>,
        failing: Vec<DnsQueryType>,
        // Delays A answers so MX settles first
        slow_a: bool,
        calls: AtomicUsize,
    }

    impl FakeDns {
        fn with(mut self, name: &str, query_type: DnsQueryType, answers: Vec<DnsAnswer>) -> Self {
            self.table.insert((name.to_string(), query_type), answers);
            self
        }
    }

    #[async_trait]
    impl DnsLookup for FakeDns {
        async fn lookup(&self, name: &str, query_type: DnsQueryType) -> Result<Vec<DnsAnswer>, DnsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.slow_a && query_type == DnsQueryType::A {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            if self.failing.contains(&query_type) {
                return Err(DnsError::Status(503));
            }
            Ok(self
                .table
                .get(&(name.to_string(), query_type))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn example_dns() -> FakeDns {
        FakeDns::default()
            .with(
                "example.com",
                DnsQueryType::A,
                vec![
                    DnsAnswer::new(DnsAnswer::TYPE_CNAME, "edge.example.net."),
                    DnsAnswer::new(DnsAnswer::TYPE_A, "93.184.216.34"),
                    DnsAnswer::new(DnsAnswer::TYPE_A, "93.184.216.35"),
                ],
            )
            .with(
                "example.com",
                DnsQueryType::Mx,
                vec![DnsAnswer::new(DnsAnswer::TYPE_MX, "10 mail.example.com.")],
            )
    }

    #[tokio::test]
    async fn test_address_skips_dns() {
        let dns = Arc::new(FakeDns::default());
        let resolver = Resolver::new(dns.clone());

        let resolved = resolver.resolve("192.0.2.1").await.unwrap();
        assert!(resolved.is_address());
        assert_eq!(resolved.address, "192.0.2.1");
        assert!(resolved.dns_records.is_empty());
        assert_eq!(dns.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_target_skips_dns() {
        let dns = Arc::new(FakeDns::default());
        let resolver = Resolver::new(dns.clone());

        let err = resolver.resolve("not a url").await.unwrap_err();
        assert_eq!(err.to_string(), "invalid target");
        assert_eq!(dns.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_domain_uses_first_a_record() {
        let dns = Arc::new(example_dns());
        let resolver = Resolver::new(dns.clone());

        let resolved = resolver.resolve("example.com").await.unwrap();
        assert!(!resolved.is_address());
        assert_eq!(resolved.address, "93.184.216.34");
        assert_eq!(
            resolved.dns_records,
            vec![
                DnsRecord::new("CNAME", "edge.example.net"),
                DnsRecord::new("A", "93.184.216.34"),
                DnsRecord::new("A", "93.184.216.35"),
                DnsRecord::new("MX", "10 mail.example.com"),
            ]
        );
        assert_eq!(dns.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_a_record_independent_of_completion_order() {
        let mut dns = example_dns();
        dns.slow_a = true;
        let resolver = Resolver::new(Arc::new(dns));

        let resolved = resolver.resolve("example.com").await.unwrap();
        assert_eq!(resolved.address, "93.184.216.34");
        assert_eq!(resolved.dns_records.first().unwrap().record_type, "CNAME");
    }

    #[tokio::test]
    async fn test_no_a_record_is_unresolvable() {
        let dns = FakeDns::default().with(
            "mail-only.example",
            DnsQueryType::Mx,
            vec![DnsAnswer::new(DnsAnswer::TYPE_MX, "5 mx.example.")],
        );
        let resolver = Resolver::new(Arc::new(dns));

        let err = resolver.resolve("mail-only.example").await.unwrap_err();
        assert_eq!(err, ResolveError::Unresolvable("mail-only.example".to_string()));
        assert_eq!(err.to_string(), "could not resolve domain");
    }

    #[tokio::test]
    async fn test_mx_failure_keeps_a_records() {
        let mut dns = example_dns();
        dns.failing = vec![DnsQueryType::Mx];
        let resolver = Resolver::new(Arc::new(dns));

        let resolved = resolver.resolve("example.com").await.unwrap();
        assert_eq!(resolved.address, "93.184.216.34");
        assert!(resolved.dns_records.iter().all(|r| r.record_type != "MX"));
    }

    #[tokio::test]
    async fn test_a_failure_is_unresolvable() {
        let mut dns = example_dns();
        dns.failing = vec![DnsQueryType::A];
        let resolver = Resolver::new(Arc::new(dns));

        assert!(matches!(
            resolver.resolve("example.com").await,
            Err(ResolveError::Unresolvable(_))
        ));
    }
}
