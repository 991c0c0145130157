//! Threat scoring
//!
//! The composite score is built from exposed services, known vulnerabilities
//! and cloud hosting, clamped to 0-100, then fused with the abuse reputation
//! confidence by taking the maximum of the two.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{TargetRecord, MAX_SCORE};

/// Ports that weigh 10 points each instead of 1
pub const HIGH_RISK_PORTS: &[u16] = &[21, 23, 25, 53, 3389, 445, 135, 139, 8080, 8443];

/// Hosting organizations that add a flat bump when they own the address
pub const CLOUD_PROVIDERS: &[&str] = &[
    "AMAZON",
    "DIGITALOCEAN",
    "GOOGLE",
    "MICROSOFT",
    "ORACLE",
    "ALIBABA",
    "TENCENT",
];

const HIGH_RISK_PORT_WEIGHT: u32 = 10;
const PORT_WEIGHT: u32 = 1;
const VULNERABILITY_WEIGHT: u32 = 20;
const CLOUD_HOSTING_WEIGHT: u32 = 5;

/// Discrete severity derived from a threat score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// Step function: ≥80 critical, ≥50 high, ≥20 medium, else low
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => ThreatLevel::Critical,
            50..=79 => ThreatLevel::High,
            20..=49 => ThreatLevel::Medium,
            _ => ThreatLevel::Low,
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::Low => f.pad("LOW"),
            ThreatLevel::Medium => f.pad("MEDIUM"),
            ThreatLevel::High => f.pad("HIGH"),
            ThreatLevel::Critical => f.pad("CRITICAL"),
        }
    }
}

/// Output of the scorer for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatAssessment {
    /// Locally computed score before fusing abuse confidence
    pub composite: u8,
    /// max(composite, abuse confidence)
    pub score: u8,
    pub level: ThreatLevel,
}

/// Whether the owner string names a known cloud provider
pub fn is_cloud_hosted(owner: Option<&str>) -> bool {
    owner
        .map(|o| o.to_uppercase())
        .is_some_and(|o| CLOUD_PROVIDERS.iter().any(|p| o.contains(p)))
}

/// Composite score from ports, vulnerabilities and ownership, clamped to 0-100
pub fn composite_score(ports: &BTreeSet<u16>, vulnerabilities: &[String], owner: Option<&str>) -> u8 {
    let mut total: u32 = ports
        .iter()
        .map(|p| {
            if HIGH_RISK_PORTS.contains(p) {
                HIGH_RISK_PORT_WEIGHT
            } else {
                PORT_WEIGHT
            }
        })
        .fold(0u32, u32::saturating_add);

    let vuln_points = u32::try_from(vulnerabilities.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(VULNERABILITY_WEIGHT);
    total = total.saturating_add(vuln_points);

    if is_cloud_hosted(owner) {
        total = total.saturating_add(CLOUD_HOSTING_WEIGHT);
    }

    total.min(u32::from(MAX_SCORE)) as u8
}

/// Score a record. Pure: the same record always yields the same assessment.
pub fn assess(record: &TargetRecord) -> ThreatAssessment {
    let composite = composite_score(
        &record.open_ports,
        &record.vulnerability_ids,
        record.owner_org.as_deref(),
    );
    let score = composite.max(record.abuse_confidence.min(MAX_SCORE));

    ThreatAssessment {
        composite,
        score,
        level: ThreatLevel::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(ports: &[u16], vulns: usize, owner: Option<&str>, abuse: u8) -> TargetRecord {
        let mut record = TargetRecord::pending("198.51.100.4");
        record.open_ports.extend(ports.iter().copied());
        record.vulnerability_ids = (0..vulns).map(|i| format!("CVE-2024-{:04}", i)).collect();
        record.owner_org = owner.map(str::to_string);
        record.abuse_confidence = abuse;
        record
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ThreatLevel::from_score(0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(19), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(20), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(49), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(50), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(79), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(80), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(100), ThreatLevel::Critical);
    }

    #[test]
    fn test_port_weights() {
        // 2 high-risk + 2 ordinary
        let record = record_with(&[21, 445, 22, 443], 0, None, 0);
        assert_eq!(assess(&record).composite, 22);
    }

    #[test]
    fn test_vulnerabilities_and_clamp() {
        let record = record_with(&[], 3, None, 0);
        assert_eq!(assess(&record).composite, 60);

        let record = record_with(&[3389], 6, None, 0);
        let assessment = assess(&record);
        assert_eq!(assessment.composite, 100);
        assert_eq!(assessment.level, ThreatLevel::Critical);
    }

    #[test]
    fn test_cloud_bump_applied_once() {
        let record = record_with(&[], 0, Some("Google LLC / Microsoft Azure"), 0);
        assert_eq!(assess(&record).composite, 5);

        let record = record_with(&[], 0, Some("amazon.com, Inc."), 0);
        assert_eq!(assess(&record).composite, 5);

        let record = record_with(&[], 0, Some("Hetzner Online GmbH"), 0);
        assert_eq!(assess(&record).composite, 0);
    }

    #[test]
    fn test_abuse_confidence_dominates() {
        let record = record_with(&[22], 0, None, 85);
        let assessment = assess(&record);
        assert_eq!(assessment.composite, 1);
        assert_eq!(assessment.score, 85);
        assert_eq!(assessment.level, ThreatLevel::Critical);

        let record = record_with(&[21, 23, 25], 0, None, 10);
        let assessment = assess(&record);
        assert_eq!(assessment.score, 30);
        assert_eq!(assessment.score, assessment.composite.max(record.abuse_confidence));
    }

    #[test]
    fn test_assess_is_pure() {
        let record = record_with(&[53, 8080, 80], 1, Some("DigitalOcean, LLC"), 40);
        let first = assess(&record);
        let second = assess(&record);
        assert_eq!(first, second);
        assert_eq!(first.composite, 46);
        assert_eq!(first.level, ThreatLevel::Medium);
    }

    #[test]
    fn test_empty_record_is_low() {
        let record = record_with(&[], 0, None, 0);
        let assessment = assess(&record);
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, ThreatLevel::Low);
    }
}
