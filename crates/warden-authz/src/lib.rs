//! Warden permission enforcement and tenant scoping.
//!
//! # Purpose
//! Decides whether a caller may perform `service.resource.action`, at which
//! grant strength, and confines CRUD operations to the caller's own project
//! unless the caller is an unscoped superuser.
//!
//! # How it fits
//! An upstream identity step resolves a token into an
//! [`IntrospectionInfo`]. Per request, the host builds an [`IamEngine`] (or an
//! [`Enforcer`] directly), derives a [`ScopingPolicy`] per resource family,
//! and routes every operation through a [`ResourceGuard`].
//!
//! # Key invariants
//! - Permission strings are `service.resource.action` with `*` wildcards.
//! - Grants order as `Deny < Regular < Full`; the strongest match wins.
//! - Enforcement always runs before scoping.
//!
//! # Important configuration
//! - [`WardenConfig`] sets the default service, policy prefix, tenant key and
//!   default permission.
//!
//! # Examples
//! ```rust
//! use warden_authz::{Enforcer, Grant};
//!
//! let enforcer = Enforcer::new(["genesis_core.vm.create", "genesis_core.vm.*"], "genesis_core")
//!     .expect("valid permissions");
//! assert_eq!(enforcer.enforce_raw("genesis_core.vm.create"), Grant::Full);
//! ```
//!
//! # Common pitfalls
//! - A `Full` grant does not bypass scoping for a caller that has a project.
//! - Denials from [`Enforcer::enforce`] are values, not errors; use
//!   [`Enforcer::require`] to fail on `Deny`.

mod config;
mod enforcer;
mod errors;
mod grant;
mod guard;
mod introspection;
mod operation;
mod permission;
mod scoping;

pub use config::WardenConfig;
pub use enforcer::{Enforcer, PermissionIndex};
pub use errors::{AuthzError, AuthzResult};
pub use grant::Grant;
pub use guard::{ResourceGuard, ScopeKind};
pub use introspection::{IamEngine, IntrospectionDriver, IntrospectionInfo, require_identity};
pub use operation::Operation;
pub use permission::{Permission, WILDCARD};
pub use scoping::{Params, ProjectRef, ScopeOutcome, ScopingPolicy};
