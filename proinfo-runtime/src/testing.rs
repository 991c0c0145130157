//! Fakes shared by the runtime tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proinfo_net::{DnsAnswer, DnsError, DnsLookup, DnsQueryType, Resolver};
use proinfo_sources::{Finding, SharedSource, SourceAdapter, SourceKind, SourceReport};

use crate::Correlator;

/// In-memory DNS: A records per name, optional panic on a name
#[derive(Default)]
pub struct FakeDns {
    a_records: HashMap<String, String>,
    panic_on: Option<String>,
}

impl FakeDns {
    pub fn with_a(mut self, name: &str, address: &str) -> Self {
        self.a_records.insert(name.to_string(), address.to_string());
        self
    }

    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panic_on = Some(name.to_string());
        self
    }
}

#[async_trait]
impl DnsLookup for FakeDns {
    async fn lookup(&self, name: &str, query_type: DnsQueryType) -> Result<Vec<DnsAnswer>, DnsError> {
        if self.panic_on.as_deref() == Some(name) {
            panic!("resolver blew up on {}", name);
        }
        match (query_type, self.a_records.get(name)) {
            (DnsQueryType::A, Some(address)) => Ok(vec![DnsAnswer::new(DnsAnswer::TYPE_A, address)]),
            _ => Ok(Vec::new()),
        }
    }
}

/// Scripted source with a call log
pub struct MockSource {
    kind: SourceKind,
    provenance: Option<String>,
    findings: HashMap<String, Finding>,
    delay: Option<Duration>,
    panics: bool,
    pub calls: AtomicUsize,
    pub addresses: Mutex<Vec<String>>,
}

impl MockSource {
    /// Answers every address with the empty finding
    pub fn empty(kind: SourceKind, provenance: &str) -> Self {
        Self {
            kind,
            provenance: Some(provenance.to_string()),
            findings: HashMap::new(),
            delay: None,
            panics: false,
            calls: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// Answers empty without provenance, like a source missing its key
    pub fn skipped(kind: SourceKind) -> Self {
        Self {
            provenance: None,
            ..Self::empty(kind, "")
        }
    }

    pub fn with_finding(mut self, address: &str, finding: Finding) -> Self {
        self.findings.insert(address.to_string(), finding);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, address: &str) -> SourceReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics {
            panic!("source blew up");
        }

        let finding = self
            .findings
            .get(address)
            .cloned()
            .unwrap_or_else(|| Finding::empty(self.kind));
        SourceReport {
            kind: self.kind,
            provenance: self.provenance.clone(),
            finding,
        }
    }
}

/// The four standard kinds, all answering empty
pub fn empty_sources() -> Vec<Arc<MockSource>> {
    vec![
        Arc::new(MockSource::empty(SourceKind::ReverseDns, "Cloudflare DoH (No Data)")),
        Arc::new(MockSource::empty(SourceKind::Whois, "ipwho.is")),
        Arc::new(MockSource::empty(SourceKind::Recon, "InternetDB")),
        Arc::new(MockSource::empty(SourceKind::Abuse, "AbuseIPDB")),
    ]
}

pub fn correlator(dns: FakeDns, sources: &[Arc<MockSource>], timeout: Duration) -> Correlator {
    let shared: Vec<SharedSource> = sources
        .iter()
        .map(|s| s.clone() as SharedSource)
        .collect();
    Correlator::new(Resolver::new(Arc::new(dns)), shared, timeout)
}

pub fn total_calls(sources: &[Arc<MockSource>]) -> usize {
    sources.iter().map(|s| s.call_count()).sum()
}
