//! ProInfo Core - Domain model for target-intelligence correlation
//!
//! This crate provides the I/O-free primitives:
//! - Target records and their PENDING → SUCCESS/ERROR lifecycle
//! - Target classification (IPv4 address vs domain) and validation
//! - Threat scoring (composite score fused with abuse confidence)
//! - The investigation forest that orders pivoted records under their parents
//! - Free-text target parsing and IOC extraction

pub mod record;
pub mod target;
pub mod score;
pub mod forest;
pub mod input;
pub mod ioc;

pub use record::*;
pub use target::*;
pub use score::*;
pub use forest::*;
pub use input::*;
pub use ioc::*;

/// Default number of targets analyzed concurrently per batch wave
pub const DEFAULT_WAVE_SIZE: usize = 5;

/// Default per-adapter timeout in seconds
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 5;

/// Maximum threat score
pub const MAX_SCORE: u8 = 100;
