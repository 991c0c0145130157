//! ProInfo Network Layer
//!
//! Provides the outbound networking used by the engine:
//! - HTTP client construction with per-request timeouts
//! - DNS-over-HTTPS lookups (A, MX, PTR)
//! - Target resolution (validation gate + domain → canonical IPv4)

pub mod client;
pub mod doh;
pub mod resolver;

pub use client::*;
pub use doh::*;
pub use resolver::*;

/// Default DNS-over-HTTPS JSON endpoint
pub const DEFAULT_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";
