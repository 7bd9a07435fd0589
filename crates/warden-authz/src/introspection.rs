//! Identity introspection contract and the per-request IAM engine.
//!
//! # Purpose
//! Defines the shape of a resolved identity (permissions plus optional
//! project) and the seam through which a host resolves it from a token.
//!
//! # How it fits
//! Hosts implement [`IntrospectionDriver`] over their token introspection
//! call. [`IamEngine`] turns the result into an [`Enforcer`] and hands out
//! [`ScopingPolicy`] values per resource family.
//!
//! # Key invariants
//! - A missing result or the empty mapping is always `Unauthorized`. Any
//!   non-empty mapping is an identity, even one granting nothing.
//! - The engine holds no global state; the host passes it explicitly to
//!   whatever handles the request.
//!
//! # Common pitfalls
//! - A `project_id` of `""` means "unscoped", not "invalid".
use crate::{AuthzError, AuthzResult, Enforcer, ScopingPolicy, WardenConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warden_common::ids::ProjectId;

/// Resolved identity for one request.
///
/// Deserializes from any key/value mapping. Only the literal empty mapping
/// (or [`IntrospectionInfo::default`]) counts as "no identity"; a mapping
/// whose keys all hold default values is still an identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct IntrospectionInfo {
    pub permissions: Vec<String>,
    pub project_id: Option<ProjectId>,
    pub user_info: Value,
    pub otp_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_hash: Option<String>,
    #[serde(skip)]
    identified: bool,
}

#[derive(Deserialize)]
struct IntrospectionFields {
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(
        default,
        deserialize_with = "warden_common::deserialize_optional_project_id"
    )]
    project_id: Option<ProjectId>,
    #[serde(default)]
    user_info: Value,
    #[serde(default)]
    otp_verified: bool,
    #[serde(default)]
    permission_hash: Option<String>,
}

impl TryFrom<Map<String, Value>> for IntrospectionInfo {
    type Error = serde_json::Error;

    fn try_from(payload: Map<String, Value>) -> Result<Self, Self::Error> {
        let identified = !payload.is_empty();
        let fields: IntrospectionFields = serde_json::from_value(Value::Object(payload))?;
        Ok(Self {
            permissions: fields.permissions,
            project_id: fields.project_id,
            user_info: fields.user_info,
            otp_verified: fields.otp_verified,
            permission_hash: fields.permission_hash,
            identified,
        })
    }
}

impl IntrospectionInfo {
    pub fn new(permissions: Vec<String>, project_id: Option<ProjectId>) -> Self {
        Self {
            permissions,
            project_id,
            identified: true,
            ..Self::default()
        }
    }

    /// True only for the empty mapping; any supplied key identifies a caller.
    pub fn is_empty(&self) -> bool {
        !self.identified
    }
}

/// Resolves a bearer token into an introspection result.
///
/// `Ok(None)` means the token resolved to no identity.
pub trait IntrospectionDriver: Send + Sync {
    fn introspection_info(&self, token: &str) -> AuthzResult<Option<IntrospectionInfo>>;
}

/// Reject absent or empty introspection results.
pub fn require_identity(info: Option<IntrospectionInfo>) -> AuthzResult<IntrospectionInfo> {
    match info {
        Some(info) if !info.is_empty() => Ok(info),
        _ => {
            tracing::warn!("request has no identity context");
            Err(AuthzError::Unauthorized)
        }
    }
}

/// Per-request authorization state built from a resolved identity.
#[derive(Debug, Clone)]
pub struct IamEngine {
    introspection: IntrospectionInfo,
    enforcer: Enforcer,
    config: WardenConfig,
}

impl IamEngine {
    /// Resolve `token` through `driver` and build the enforcer.
    ///
    /// # Errors
    /// - [`AuthzError::Unauthorized`] when the driver finds no identity.
    /// - [`AuthzError::MalformedPermission`] when a granted permission is not
    ///   a triple.
    /// - Any error returned by the driver itself.
    pub fn new(
        token: &str,
        driver: &dyn IntrospectionDriver,
        config: WardenConfig,
    ) -> AuthzResult<Self> {
        let introspection = require_identity(driver.introspection_info(token)?)?;
        Self::from_introspection(introspection, config)
    }

    pub fn from_introspection(
        introspection: IntrospectionInfo,
        config: WardenConfig,
    ) -> AuthzResult<Self> {
        let introspection = require_identity(Some(introspection))?;
        let enforcer = Enforcer::new(&introspection.permissions, config.default_service.clone())?;
        Ok(Self {
            introspection,
            enforcer,
            config,
        })
    }

    /// Replace the enforcer built from the introspection result.
    pub fn with_enforcer(mut self, enforcer: Enforcer) -> Self {
        self.enforcer = enforcer;
        self
    }

    pub fn introspection(&self) -> &IntrospectionInfo {
        &self.introspection
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.introspection.project_id
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// Scoping policy for one resource family; `None` requires the
    /// configured default permission instead of per-action ones.
    pub fn scoping_policy(&self, policy_name: Option<&str>) -> ScopingPolicy {
        ScopingPolicy::new(
            self.enforcer.clone(),
            self.project_id(),
            policy_name.map(str::to_string),
            self.config.clone(),
        )
    }
}
