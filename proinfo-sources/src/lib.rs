//! ProInfo Sources
//!
//! Independent intelligence sources queried for every resolved address:
//! - **Reverse DNS**: PTR lookup over DNS-over-HTTPS
//! - **WHOIS/Geo**: owner, country, ASN and coordinates (ipwho.is)
//! - **Recon**: open ports, CVEs, hostnames and CPEs (Shodan InternetDB)
//! - **Abuse**: reputation confidence and usage type (AbuseIPDB)
//!
//! Every source implements [`SourceAdapter`] and never fails past its own
//! boundary: provider errors degrade to an empty [`SourceReport`].

pub mod traits;
pub mod credentials;
pub mod reverse_dns;
pub mod whois;
pub mod recon;
pub mod abuse;
pub mod registry;

pub use traits::*;
pub use credentials::*;
pub use reverse_dns::*;
pub use whois::*;
pub use recon::*;
pub use abuse::*;
pub use registry::*;
