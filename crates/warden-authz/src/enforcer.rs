//! Hierarchical permission enforcer.
//!
//! # Purpose
//! Indexes a caller's granted permission strings and answers "what grant
//! applies to `service.resource.action`?".
//!
//! # How it fits
//! Built once per request from the introspection result, then consulted by
//! [`crate::ScopingPolicy`] before any tenant scoping happens.
//!
//! # Key invariants
//! - Every granted string becomes exactly one `(service, resource, action)`
//!   index entry; malformed strings fail construction.
//! - The index is never written after construction, so a shared `&Enforcer`
//!   is safe to read from many threads.
//! - When several entries match, the strongest grant wins.
//!
//! # Examples
//! ```rust
//! use warden_authz::{Enforcer, Grant};
//!
//! let enforcer = Enforcer::new(["genesis_core.vm.create"], "genesis_core").expect("valid");
//! assert_eq!(enforcer.enforce("vm", "create"), Grant::Regular);
//! assert_eq!(enforcer.enforce("vm", "delete"), Grant::Deny);
//! ```
use crate::permission::WILDCARD;
use crate::{AuthzError, AuthzResult, Grant, Permission};
use std::collections::{HashMap, HashSet};

/// `service -> resource -> {action}`.
pub type PermissionIndex = HashMap<String, HashMap<String, HashSet<String>>>;

#[derive(Debug, Clone, Default)]
pub struct Enforcer {
    index: PermissionIndex,
    default_service: String,
}

impl Enforcer {
    /// Build an enforcer from granted permission strings.
    ///
    /// # Errors
    /// - [`AuthzError::MalformedPermission`] for the first entry that is not a
    ///   `service.resource.action` triple.
    pub fn new<I>(permissions: I, default_service: impl Into<String>) -> AuthzResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut index = PermissionIndex::new();
        for raw in permissions {
            let permission = Permission::parse(raw.as_ref())?;
            index
                .entry(permission.service)
                .or_default()
                .entry(permission.resource)
                .or_default()
                .insert(permission.action);
        }
        let default_service = default_service.into();
        tracing::debug!(
            services = index.len(),
            default_service = %default_service,
            "permission index built"
        );
        Ok(Self {
            index,
            default_service,
        })
    }

    pub fn index(&self) -> &PermissionIndex {
        &self.index
    }

    /// Resolve the grant for a fully qualified permission string.
    ///
    /// A query that is not a triple can only be satisfied by the global
    /// `*.*.*` rule.
    pub fn enforce_raw(&self, permission: &str) -> Grant {
        match Permission::parse(permission) {
            Ok(query) => self.lookup(&query),
            Err(_) if self.has_global() => Grant::Full,
            Err(_) => Grant::Deny,
        }
    }

    /// Resolve `resource.action` under the default service.
    pub fn enforce(&self, resource: &str, action: &str) -> Grant {
        self.enforce_in(&self.default_service, resource, action)
    }

    /// Resolve `service.resource.action` through [`Enforcer::enforce_raw`],
    /// so empty or dotted segments are judged exactly like the joined string.
    pub fn enforce_in(&self, service: &str, resource: &str, action: &str) -> Grant {
        let grant = self.enforce_raw(&Permission::new(service, resource, action).to_string());
        tracing::debug!(service, resource, action, %grant, "permission enforced");
        grant
    }

    /// Like [`Enforcer::enforce`] but a denial becomes
    /// [`AuthzError::PolicyNotAuthorized`] naming the denied permission.
    pub fn require(&self, resource: &str, action: &str) -> AuthzResult<Grant> {
        self.require_or(None, resource, action, AuthzError::policy_not_authorized)
    }

    /// Resolve a grant, building the caller's own error from the denied
    /// permission string on `Deny`. `service` falls back to the default
    /// service.
    pub fn require_or<E, F>(
        &self,
        service: Option<&str>,
        resource: &str,
        action: &str,
        exc: F,
    ) -> Result<Grant, E>
    where
        F: FnOnce(String) -> E,
    {
        let service = service.unwrap_or(&self.default_service);
        let grant = self.enforce_in(service, resource, action);
        if grant == Grant::Deny {
            let permission = Permission::new(service, resource, action).to_string();
            tracing::warn!(permission = %permission, "permission denied");
            return Err(exc(permission));
        }
        Ok(grant)
    }

    fn has_global(&self) -> bool {
        self.index
            .get(WILDCARD)
            .and_then(|resources| resources.get(WILDCARD))
            .is_some_and(|actions| actions.contains(WILDCARD))
    }

    fn lookup(&self, query: &Permission) -> Grant {
        let mut grant = Grant::Deny;
        for service in candidates(&query.service) {
            let Some(resources) = self.index.get(service) else {
                continue;
            };
            for resource in candidates(&query.resource) {
                let Some(actions) = resources.get(resource) else {
                    continue;
                };
                // Nothing beats a wildcard action; stop early.
                if actions.contains(WILDCARD) {
                    return Grant::Full;
                }
                if actions.contains(query.action.as_str()) {
                    grant = Grant::Regular;
                }
            }
        }
        grant
    }
}

// A literal `*` in the query only matches a stored `*`.
fn candidates(segment: &str) -> impl Iterator<Item = &str> {
    let wildcard = (segment != WILDCARD).then_some(WILDCARD);
    std::iter::once(segment).chain(wildcard)
}
