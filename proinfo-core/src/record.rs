//! Target records - the unit of intelligence for one investigated entity
//!
//! A record is created PENDING when a target is accepted and is moved exactly
//! once to SUCCESS or ERROR. The terminal transitions consume the record so a
//! finished record cannot be transitioned again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{assess, classify, ThreatAssessment, ThreatLevel};

/// Kind of submitted target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Ip,
    Domain,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Ip => f.pad("IP"),
            TargetKind::Domain => f.pad("DOMAIN"),
        }
    }
}

/// Analysis status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    #[default]
    Pending,
    Success,
    Error,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Pending => f.pad("PENDING"),
            RecordStatus::Success => f.pad("SUCCESS"),
            RecordStatus::Error => f.pad("ERROR"),
        }
    }
}

/// A single DNS answer attached to a domain record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    /// Record type name (A, CNAME, MX, ...)
    pub record_type: String,
    /// Record data as returned by the resolver
    pub value: String,
}

impl DnsRecord {
    pub fn new(record_type: &str, value: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            value: value.to_string(),
        }
    }
}

/// Aggregated intelligence for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRecord {
    /// Originally submitted string, the stable display key
    pub identifier: String,
    pub kind: TargetKind,
    /// Canonical IPv4 address used for all source lookups
    pub resolved_address: Option<String>,
    pub reverse_hostname: Option<String>,
    pub owner_org: Option<String>,
    pub country_code: Option<String>,
    /// Formatted as `AS<number>`
    pub asn: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub open_ports: BTreeSet<u16>,
    /// CVE identifiers in source order
    pub vulnerability_ids: Vec<String>,
    pub hostnames: Vec<String>,
    /// CPE platform identifiers
    pub platform_ids: Vec<String>,
    pub usage_type: Option<String>,
    pub dns_records: Vec<DnsRecord>,
    /// Candidate pivot targets derived from this record
    pub linked_assets: Vec<String>,
    /// Abuse reputation confidence (0-100), 0 when unavailable
    pub abuse_confidence: u8,
    pub threat_score: u8,
    pub threat_level: ThreatLevel,
    pub status: RecordStatus,
    pub error_reason: Option<String>,
    pub source_attribution: Option<String>,
    /// Pivot hops from an originally submitted target
    pub depth: u32,
    /// Identifier of the record this one was pivoted from
    pub origin_target: Option<String>,
}

impl TargetRecord {
    /// A pending record for direct user input
    pub fn pending(identifier: &str) -> Self {
        Self::pending_at(identifier, 0, None)
    }

    /// A pending record at a given pivot depth
    pub fn pending_at(identifier: &str, depth: u32, origin_target: Option<&str>) -> Self {
        Self {
            identifier: identifier.to_string(),
            kind: classify(identifier),
            resolved_address: None,
            reverse_hostname: None,
            owner_org: None,
            country_code: None,
            asn: None,
            latitude: None,
            longitude: None,
            open_ports: BTreeSet::new(),
            vulnerability_ids: Vec::new(),
            hostnames: Vec::new(),
            platform_ids: Vec::new(),
            usage_type: None,
            dns_records: Vec::new(),
            linked_assets: Vec::new(),
            abuse_confidence: 0,
            threat_score: 0,
            threat_level: ThreatLevel::Low,
            status: RecordStatus::Pending,
            error_reason: None,
            source_attribution: None,
            depth,
            origin_target: origin_target.map(str::to_string),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RecordStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }

    /// Finish the record successfully, deriving its threat score and level
    pub fn succeed(mut self) -> Self {
        let assessment = assess(&self);
        self.apply_assessment(assessment);
        self.status = RecordStatus::Success;
        self.error_reason = None;
        self
    }

    /// Finish the record with an error
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.status = RecordStatus::Error;
        self.error_reason = Some(reason.into());
        self
    }

    pub fn apply_assessment(&mut self, assessment: ThreatAssessment) {
        self.threat_score = assessment.score;
        self.threat_level = assessment.level;
    }
}
