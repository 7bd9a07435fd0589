//! Tenant scoping layered on top of permission enforcement.
//!
//! # Purpose
//! Decides, per operation, whether the caller's grant admits it and whether
//! the operation's tenant identifier must be validated or injected.
//!
//! # How it fits
//! Resource guards call into a [`ScopingPolicy`] before handing parameters to
//! business logic. The policy may add the tenant key to the parameter map.
//!
//! # Key invariants
//! - The grant is always checked first; a denial stops before any scoping.
//! - Only a `Full` grant held by a caller with no project skips scoping. A
//!   scoped caller with `Full` is still confined to its own project.
//! - Identifiers are compared as parsed UUIDs, never as raw text.
//!
//! # Examples
//! ```rust
//! use warden_authz::{Enforcer, Params, ScopeOutcome, ScopingPolicy, WardenConfig};
//! use warden_common::ids::ProjectId;
//!
//! let project: ProjectId = "fbe1fc09-e4cc-4cd2-a51d-c823b40155b2".parse().expect("uuid");
//! let enforcer = Enforcer::new(["genesis_core.vm.create"], "genesis_core").expect("valid");
//! let policy = ScopingPolicy::new(enforcer, Some(project), Some("vm".into()), WardenConfig::default());
//!
//! let mut params = Params::new();
//! let outcome = policy.scope_params("create", &mut params).expect("allowed");
//! assert_eq!(outcome, ScopeOutcome::Injected);
//! assert_eq!(params["project_id"], project.to_string());
//! ```
//!
//! # Common pitfalls
//! - Passing a tenant identifier that is not UUID-shaped fails with
//!   `InvalidProjectId`, not `Forbidden`.
use crate::introspection::require_identity;
use crate::{AuthzError, AuthzResult, Enforcer, Grant, IntrospectionInfo, WardenConfig};
use serde_json::Value;
use warden_common::ids::ProjectId;

/// Operation input or filter parameters, keyed by parameter name.
pub type Params = serde_json::Map<String, Value>;

const UNSCOPED: &str = "<unscoped>";

/// How a scoped operation was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOutcome {
    /// Unscoped caller with a full grant; nothing checked or added.
    Skipped,
    /// A caller-supplied identifier matched the caller's project.
    Validated,
    /// The caller's project was written into the parameters.
    Injected,
    /// The resource has no project of its own; only the grant was checked.
    EnforcedOnly,
}

/// A tenant identifier as supplied by a caller, before canonicalisation.
#[derive(Debug, Clone, Copy)]
pub enum ProjectRef<'a> {
    Id(ProjectId),
    Raw(&'a str),
    Value(&'a Value),
}

impl ProjectRef<'_> {
    /// Parse into the canonical identifier.
    pub fn resolve(self) -> AuthzResult<ProjectId> {
        match self {
            ProjectRef::Id(id) => Ok(id),
            ProjectRef::Raw(raw) => Ok(raw.parse()?),
            ProjectRef::Value(Value::String(raw)) => Ok(raw.parse()?),
            ProjectRef::Value(other) => Err(AuthzError::InvalidProjectId(other.to_string())),
        }
    }
}

impl From<ProjectId> for ProjectRef<'_> {
    fn from(id: ProjectId) -> Self {
        ProjectRef::Id(id)
    }
}

impl<'a> From<&'a str> for ProjectRef<'a> {
    fn from(raw: &'a str) -> Self {
        ProjectRef::Raw(raw)
    }
}

impl<'a> From<&'a String> for ProjectRef<'a> {
    fn from(raw: &'a String) -> Self {
        ProjectRef::Raw(raw)
    }
}

impl<'a> From<&'a Value> for ProjectRef<'a> {
    fn from(value: &'a Value) -> Self {
        ProjectRef::Value(value)
    }
}

/// Enforcement plus tenant scoping for one resource family.
#[derive(Debug, Clone)]
pub struct ScopingPolicy {
    enforcer: Enforcer,
    project_id: Option<ProjectId>,
    policy_name: Option<String>,
    config: WardenConfig,
}

impl ScopingPolicy {
    pub fn new(
        enforcer: Enforcer,
        project_id: Option<ProjectId>,
        policy_name: Option<String>,
        config: WardenConfig,
    ) -> Self {
        Self {
            enforcer,
            project_id,
            policy_name,
            config,
        }
    }

    /// Build directly from an introspection result.
    ///
    /// # Errors
    /// - [`AuthzError::Unauthorized`] if `info` is absent or empty.
    /// - [`AuthzError::MalformedPermission`] for a bad permission entry.
    pub fn from_introspection(
        info: Option<&IntrospectionInfo>,
        policy_name: Option<&str>,
        config: WardenConfig,
    ) -> AuthzResult<Self> {
        let info = require_identity(info.cloned())?;
        let enforcer = Enforcer::new(&info.permissions, config.default_service.clone())?;
        Ok(Self::new(
            enforcer,
            info.project_id,
            policy_name.map(str::to_string),
            config,
        ))
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn policy_name(&self) -> Option<&str> {
        self.policy_name.as_deref()
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    pub fn tenant_key(&self) -> &str {
        &self.config.tenant_key
    }

    /// Fully qualified permission checked for `action`.
    pub fn policy_key(&self, action: &str) -> String {
        match &self.policy_name {
            Some(name) => format!("{}.{}.{}", self.config.policy_prefix, name, action),
            None => self.config.default_permission.clone(),
        }
    }

    /// Resolve the grant for `action`, failing on `Deny`.
    pub fn enforce(&self, action: &str) -> AuthzResult<Grant> {
        let key = self.policy_key(action);
        let grant = self.enforcer.enforce_raw(&key);
        if grant == Grant::Deny {
            tracing::warn!(permission = %key, "policy denied");
            return Err(AuthzError::policy_not_authorized(key));
        }
        tracing::debug!(permission = %key, %grant, "policy allowed");
        Ok(grant)
    }

    /// Enforce only; for resources that carry no project of their own.
    pub fn check(&self, action: &str) -> AuthzResult<ScopeOutcome> {
        self.enforce(action)?;
        Ok(ScopeOutcome::EnforcedOnly)
    }

    /// Fail unless `supplied` names the caller's own project.
    pub fn force_project_id<'a>(&self, supplied: impl Into<ProjectRef<'a>>) -> AuthzResult<()> {
        let supplied = supplied.into().resolve()?;
        match self.project_id {
            Some(own) if own == supplied => Ok(()),
            own => {
                let expected = own.map_or_else(|| UNSCOPED.to_string(), |id| id.to_string());
                tracing::warn!(
                    expected = %expected,
                    actual = %supplied,
                    "cross-project access rejected"
                );
                Err(AuthzError::Forbidden {
                    expected,
                    actual: supplied.to_string(),
                })
            }
        }
    }

    /// Validating mode: the operation names a project explicitly.
    pub fn authorize_project_id<'a>(
        &self,
        action: &str,
        supplied: impl Into<ProjectRef<'a>>,
    ) -> AuthzResult<ScopeOutcome> {
        let grant = self.enforce(action)?;
        if self.bypasses_scoping(grant) {
            return Ok(self.skipped(action));
        }
        self.force_project_id(supplied)?;
        tracing::debug!(action, "project validated");
        Ok(ScopeOutcome::Validated)
    }

    /// Injecting mode: validate the tenant key if present, otherwise set it
    /// to the caller's project.
    pub fn scope_params(&self, action: &str, params: &mut Params) -> AuthzResult<ScopeOutcome> {
        let grant = self.enforce(action)?;
        if self.bypasses_scoping(grant) {
            return Ok(self.skipped(action));
        }
        if let Some(supplied) = params.get(&self.config.tenant_key) {
            self.force_project_id(supplied)?;
            tracing::debug!(action, "project validated");
            return Ok(ScopeOutcome::Validated);
        }
        let Some(own) = self.project_id else {
            tracing::warn!(action, "unscoped caller cannot be confined to a project");
            return Err(AuthzError::Forbidden {
                expected: UNSCOPED.to_string(),
                actual: UNSCOPED.to_string(),
            });
        };
        params.insert(self.config.tenant_key.clone(), Value::String(own.to_string()));
        tracing::debug!(action, project_id = %own, "project injected");
        Ok(ScopeOutcome::Injected)
    }

    fn bypasses_scoping(&self, grant: Grant) -> bool {
        grant >= Grant::Full && self.project_id.is_none()
    }

    fn skipped(&self, action: &str) -> ScopeOutcome {
        tracing::debug!(action, "unscoped full grant, scoping skipped");
        ScopeOutcome::Skipped
    }
}
