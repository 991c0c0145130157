//! Provider credentials and endpoints
//!
//! Keys are optional. A source without its key either runs against the free
//! endpoint or is skipped with an empty result; a missing key is never an error.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use proinfo_net::DEFAULT_DOH_ENDPOINT;

/// Optional API keys per provider
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// AbuseIPDB key; the abuse source is skipped without it
    pub abuseipdb_key: Option<String>,
    /// ipwhois key; the free endpoint is used without it
    pub ipwhois_key: Option<String>,
}

impl Credentials {
    /// Read keys from `ABUSEIPDB_API_KEY` and `IPWHOIS_API_KEY`
    pub fn from_env() -> Self {
        Self {
            abuseipdb_key: non_empty_var("ABUSEIPDB_API_KEY"),
            ipwhois_key: non_empty_var("IPWHOIS_API_KEY"),
        }
    }

    /// Fill keys missing here from `other`
    pub fn or(self, other: Credentials) -> Self {
        Self {
            abuseipdb_key: self.abuseipdb_key.or(other.abuseipdb_key),
            ipwhois_key: self.ipwhois_key.or(other.ipwhois_key),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn redact(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("abuseipdb_key", &redact(&self.abuseipdb_key))
            .field("ipwhois_key", &redact(&self.ipwhois_key))
            .finish()
    }
}

/// Base URLs for every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub doh: String,
    pub ipwhois: String,
    pub internetdb: String,
    pub abuseipdb: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            doh: DEFAULT_DOH_ENDPOINT.to_string(),
            ipwhois: "https://ipwho.is".to_string(),
            internetdb: "https://internetdb.shodan.io".to_string(),
            abuseipdb: "https://api.abuseipdb.com/api/v2".to_string(),
        }
    }
}
