//! Permission triples and their parser.
//!
//! # Purpose
//! Parses `service.resource.action` strings into typed triples.
//!
//! # How it fits
//! The enforcer parses every granted permission at construction and every
//! query at lookup time through the same [`Permission::parse`].
//!
//! # Key invariants
//! - Exactly three `.`-separated segments, none empty.
//! - Any segment may be the wildcard `*`.
//!
//! # Examples
//! ```rust
//! use warden_authz::Permission;
//!
//! let permission = Permission::parse("genesis_core.vm.*").expect("valid");
//! assert!(permission.has_wildcard_action());
//! assert_eq!(permission.to_string(), "genesis_core.vm.*");
//! ```
//!
//! # Common pitfalls
//! - Dots inside a segment are not escapable; `a.b.c.d` is rejected.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

pub const WILDCARD: &str = "*";

/// A single `service.resource.action` rule or query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub service: String,
    pub resource: String,
    pub action: String,
}

impl Permission {
    pub fn new(
        service: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Parse a permission string.
    ///
    /// # Errors
    /// - [`AuthzError::MalformedPermission`] unless the input splits into
    ///   exactly three non-empty segments.
    pub fn parse(value: &str) -> AuthzResult<Self> {
        value.parse()
    }

    pub fn has_wildcard_action(&self) -> bool {
        self.action == WILDCARD
    }

    /// True for the superuser rule `*.*.*`.
    pub fn is_global(&self) -> bool {
        self.service == WILDCARD && self.resource == WILDCARD && self.action == WILDCARD
    }
}

impl std::str::FromStr for Permission {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split('.');
        let (Some(service), Some(resource), Some(action), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthzError::MalformedPermission(value.to_string()));
        };
        if service.is_empty() || resource.is_empty() || action.is_empty() {
            return Err(AuthzError::MalformedPermission(value.to_string()));
        }
        Ok(Self::new(service, resource, action))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.service, self.resource, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_triple() {
        let parsed = Permission::parse("service.resource.action").expect("parse permission");
        assert_eq!(parsed, Permission::new("service", "resource", "action"));
        assert_eq!(parsed.to_string(), "service.resource.action");
        assert!(!parsed.has_wildcard_action());
        assert!(!parsed.is_global());
    }

    #[test]
    fn parse_wildcards() {
        let parsed = Permission::parse("*.*.*").expect("parse global");
        assert!(parsed.is_global());
        assert!(parsed.has_wildcard_action());
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        for raw in ["only.two", "a.b.c.d", "", "single", "a..b.c"] {
            let err = Permission::parse(raw).expect_err("malformed");
            assert!(matches!(err, AuthzError::MalformedPermission(ref s) if s == raw));
        }
    }

    #[test]
    fn parse_rejects_empty_segments() {
        for raw in ["a.b.", ".b.c", "a..c", ".."] {
            let err = Permission::parse(raw).expect_err("empty segment");
            assert!(matches!(err, AuthzError::MalformedPermission(_)));
        }
    }
}
