//! DNS-over-HTTPS lookups
//!
//! Queries a JSON DoH endpoint (`Accept: application/dns-json`). A response
//! without an `Answer` array means no records, not an error.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::DEFAULT_DOH_ENDPOINT;

/// Record types the engine asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsQueryType {
    A,
    Mx,
    Ptr,
}

impl DnsQueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsQueryType::A => "A",
            DnsQueryType::Mx => "MX",
            DnsQueryType::Ptr => "PTR",
        }
    }
}

impl fmt::Display for DnsQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer from a DoH response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsAnswer {
    /// Numeric RR type (1 = A, 5 = CNAME, 12 = PTR, 15 = MX)
    #[serde(rename = "type")]
    pub record_type: u16,
    pub data: String,
}

impl DnsAnswer {
    pub const TYPE_A: u16 = 1;
    pub const TYPE_CNAME: u16 = 5;
    pub const TYPE_PTR: u16 = 12;
    pub const TYPE_MX: u16 = 15;

    pub fn new(record_type: u16, data: &str) -> Self {
        Self {
            record_type,
            data: data.to_string(),
        }
    }

    pub fn is_a(&self) -> bool {
        self.record_type == Self::TYPE_A
    }

    /// Mnemonic for the record type
    pub fn type_name(&self) -> String {
        match self.record_type {
            Self::TYPE_A => "A".to_string(),
            2 => "NS".to_string(),
            Self::TYPE_CNAME => "CNAME".to_string(),
            Self::TYPE_PTR => "PTR".to_string(),
            Self::TYPE_MX => "MX".to_string(),
            16 => "TXT".to_string(),
            28 => "AAAA".to_string(),
            other => format!("TYPE{}", other),
        }
    }
}

/// Errors from DoH lookups
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DoH request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("DoH returned status: {0}")]
    Status(u16),

    #[error("Malformed DoH response: {0}")]
    Parse(String),
}

/// Transport for DNS queries
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Resolve `name` for `query_type`; an empty vec means no records
    async fn lookup(&self, name: &str, query_type: DnsQueryType) -> Result<Vec<DnsAnswer>, DnsError>;
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsAnswer>,
}

/// Parse a DoH JSON body into its answers
pub fn parse_doh_response(body: &str) -> Result<Vec<DnsAnswer>, DnsError> {
    serde_json::from_str::<DohResponse>(body)
        .map(|r| r.answer)
        .map_err(|e| DnsError::Parse(e.to_string()))
}

/// Strip the trailing root dot from a DNS name
pub fn trim_root_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// DoH client over a JSON endpoint
#[derive(Clone)]
pub struct DohClient {
    client: Client,
    endpoint: String,
}

impl DohClient {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, DEFAULT_DOH_ENDPOINT)
    }

    pub fn with_endpoint(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_url(&self, name: &str, query_type: DnsQueryType) -> String {
        format!(
            "{}?name={}&type={}",
            self.endpoint,
            urlencoding::encode(name),
            query_type
        )
    }
}

#[async_trait]
impl DnsLookup for DohClient {
    async fn lookup(&self, name: &str, query_type: DnsQueryType) -> Result<Vec<DnsAnswer>, DnsError> {
        let url = self.query_url(name, query_type);
        debug!("DoH {} lookup for {}", query_type, name);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/dns-json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DnsError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_doh_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answers() {
        let body = r#"{
            "Status": 0,
            "Question": [{"name": "example.com", "type": 1}],
            "Answer": [
                {"name": "example.com", "type": 5, "TTL": 300, "data": "edge.example.net."},
                {"name": "edge.example.net", "type": 1, "TTL": 60, "data": "93.184.216.34"}
            ]
        }"#;

        let answers = parse_doh_response(body).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].type_name(), "CNAME");
        assert!(answers[1].is_a());
        assert_eq!(answers[1].data, "93.184.216.34");
    }

    #[test]
    fn test_missing_answer_is_empty() {
        let body = r#"{"Status": 3, "Question": [{"name": "nx.invalid", "type": 1}]}"#;
        assert!(parse_doh_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_doh_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, DnsError::Parse(_)));
    }

    #[test]
    fn test_query_url() {
        let doh = DohClient::with_endpoint(Client::new(), "https://dns.test/dns-query");
        assert_eq!(
            doh.query_url("1.2.0.192.in-addr.arpa", DnsQueryType::Ptr),
            "https://dns.test/dns-query?name=1.2.0.192.in-addr.arpa&type=PTR"
        );
    }

    #[test]
    fn test_trim_root_dot() {
        assert_eq!(trim_root_dot("dns.google."), "dns.google");
        assert_eq!(trim_root_dot("dns.google"), "dns.google");
    }
}
