//! Target classification and validation
//!
//! A submitted target is either a dotted-quad IPv4 address or a domain name.
//! Anything that is neither a dotted quad nor contains a dot (with the single
//! exception of `localhost`) is rejected before any network call is made.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::TargetKind;

static DOTTED_QUAD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").unwrap()
});

/// Errors from target validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("invalid target")]
    Invalid { target: String },
}

/// Whether `target` is syntactically a dotted-quad IPv4 address
pub fn is_dotted_quad(target: &str) -> bool {
    DOTTED_QUAD_REGEX.is_match(target)
}

/// Classify a target without validating it
pub fn classify(target: &str) -> TargetKind {
    if is_dotted_quad(target) {
        TargetKind::Ip
    } else {
        TargetKind::Domain
    }
}

/// Synchronous validation gate ahead of resolution
pub fn validate(target: &str) -> Result<TargetKind, TargetError> {
    let kind = classify(target);
    if kind == TargetKind::Domain && !target.contains('.') && target != "localhost" {
        return Err(TargetError::Invalid {
            target: target.to_string(),
        });
    }
    Ok(kind)
}

/// Build the `in-addr.arpa` name used for a PTR lookup of an IPv4 address
pub fn reverse_pointer_name(address: &str) -> String {
    let reversed: Vec<&str> = address.split('.').rev().collect();
    format!("{}.in-addr.arpa", reversed.join("."))
}
