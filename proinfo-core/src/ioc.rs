//! Indicator-of-compromise extraction and defanging
//!
//! Pulls IPv4 addresses, domains, URLs and file hashes out of messy text
//! (mail headers, logs, reports). Extracted network indicators can be
//! defanged for safe sharing or fed back in as investigation targets.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static IPV4_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap()
});

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]\b").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?|hxxp|ftp)://[^\s"']+"#).unwrap()
});

static HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-fA-F0-9]{32,64}\b").unwrap()
});

/// Indicators extracted from a block of text, deduplicated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IocSet {
    pub ips: Vec<String>,
    pub domains: Vec<String>,
    pub urls: Vec<String>,
    pub hashes: Vec<String>,
}

impl IocSet {
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.domains.is_empty() && self.urls.is_empty() && self.hashes.is_empty()
    }

    pub fn total(&self) -> usize {
        self.ips.len() + self.domains.len() + self.urls.len() + self.hashes.len()
    }

    /// Copy with network indicators defanged. Hashes are left untouched.
    pub fn defanged(&self) -> Self {
        Self {
            ips: self.ips.iter().map(|s| defang(s)).collect(),
            domains: self.domains.iter().map(|s| defang(s)).collect(),
            urls: self.urls.iter().map(|s| defang(s)).collect(),
            hashes: self.hashes.clone(),
        }
    }

    /// IPs and domains, usable as investigation targets
    pub fn targets(&self) -> Vec<String> {
        self.ips.iter().chain(self.domains.iter()).cloned().collect()
    }
}

fn unique(regex: &Regex, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    regex
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Extract all indicators from text content
pub fn extract_iocs(text: &str) -> IocSet {
    let hashes = unique(&HASH_REGEX, text);
    let domains = unique(&DOMAIN_REGEX, text)
        .into_iter()
        // Numeric runs such as IPs also satisfy the domain pattern
        .filter(|d| has_alphabetic_tld(d))
        .collect();

    IocSet {
        ips: unique(&IPV4_REGEX, text),
        domains,
        urls: unique(&URL_REGEX, text),
        hashes,
    }
}

fn has_alphabetic_tld(domain: &str) -> bool {
    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| tld.chars().any(|c| c.is_ascii_alphabetic()))
}

/// Defang an indicator: every `.` becomes `[.]` and the first `http` becomes `hxxp`
pub fn defang(indicator: &str) -> String {
    indicator.replace('.', "[.]").replacen("http", "hxxp", 1)
}
