//! Per-resource guards that pick a scoping mode for each CRUD operation.
//!
//! # Purpose
//! Wraps a [`ScopingPolicy`] with the routing rules for the three kinds of
//! resources a host exposes: project-owned, nested under a parent, and
//! project-less.
//!
//! # How it fits
//! A host handler builds one guard per request and calls the method matching
//! the incoming operation before running its own logic, passing along any
//! parameters the guard returns or mutates.
//!
//! # Key invariants
//! - Nested resources are only enforced; the parent lookup carries scoping.
//! - `update` and `delete` on project-owned resources return the lookup
//!   filters the host must apply when loading the target row.
use crate::{AuthzResult, Operation, Params, ProjectRef, ScopeOutcome, ScopingPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Rows carry the tenant key and are confined to the caller's project.
    ProjectScoped,
    /// Rows are reached through a parent that was already scoped.
    Nested,
    /// Reads and writes of existing rows are global; create and filter are
    /// still confined.
    WithoutProject,
}

#[derive(Debug, Clone)]
pub struct ResourceGuard {
    policy: ScopingPolicy,
    kind: ScopeKind,
}

impl ResourceGuard {
    pub fn new(policy: ScopingPolicy, kind: ScopeKind) -> Self {
        Self { policy, kind }
    }

    pub fn project_scoped(policy: ScopingPolicy) -> Self {
        Self::new(policy, ScopeKind::ProjectScoped)
    }

    pub fn nested(policy: ScopingPolicy) -> Self {
        Self::new(policy, ScopeKind::Nested)
    }

    pub fn without_project(policy: ScopingPolicy) -> Self {
        Self::new(policy, ScopeKind::WithoutProject)
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn policy(&self) -> &ScopingPolicy {
        &self.policy
    }

    pub fn create(&self, params: &mut Params) -> AuthzResult<ScopeOutcome> {
        let action = Operation::Create.policy_action();
        match self.kind {
            ScopeKind::Nested => self.policy.check(action),
            ScopeKind::ProjectScoped | ScopeKind::WithoutProject => {
                self.policy.scope_params(action, params)
            }
        }
    }

    pub fn get(&self, params: &mut Params) -> AuthzResult<ScopeOutcome> {
        let action = Operation::Get.policy_action();
        match self.kind {
            ScopeKind::ProjectScoped => self.policy.scope_params(action, params),
            ScopeKind::Nested | ScopeKind::WithoutProject => self.policy.check(action),
        }
    }

    pub fn filter(&self, filters: &mut Params) -> AuthzResult<ScopeOutcome> {
        let action = Operation::Filter.policy_action();
        match self.kind {
            ScopeKind::Nested => self.policy.check(action),
            ScopeKind::ProjectScoped | ScopeKind::WithoutProject => {
                self.policy.scope_params(action, filters)
            }
        }
    }

    /// Admit an update and return the filters for loading the target.
    ///
    /// A scoped caller may not move a row to another project through
    /// `values`.
    pub fn update(&self, values: &Params) -> AuthzResult<Params> {
        let action = Operation::Update.policy_action();
        let mut filters = Params::new();
        match self.kind {
            ScopeKind::ProjectScoped => {
                self.policy.scope_params(action, &mut filters)?;
                if self.policy.project_id().is_some() {
                    if let Some(target) = values.get(self.policy.tenant_key()) {
                        self.policy.force_project_id(target)?;
                    }
                }
            }
            ScopeKind::Nested | ScopeKind::WithoutProject => {
                self.policy.check(action)?;
            }
        }
        Ok(filters)
    }

    /// Admit a delete and return the filters for loading the target.
    pub fn delete(&self) -> AuthzResult<Params> {
        let action = Operation::Delete.policy_action();
        let mut filters = Params::new();
        match self.kind {
            ScopeKind::ProjectScoped => {
                self.policy.scope_params(action, &mut filters)?;
            }
            ScopeKind::Nested | ScopeKind::WithoutProject => {
                self.policy.check(action)?;
            }
        }
        Ok(filters)
    }

    /// Admit an operation addressed by an explicit project, such as a
    /// path-scoped get or delete.
    pub fn authorize_in_project<'a>(
        &self,
        operation: Operation,
        project_id: impl Into<ProjectRef<'a>>,
    ) -> AuthzResult<ScopeOutcome> {
        let action = operation.policy_action();
        match self.kind {
            ScopeKind::ProjectScoped => self.policy.authorize_project_id(action, project_id),
            ScopeKind::Nested | ScopeKind::WithoutProject => self.policy.check(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthzError, Enforcer, WardenConfig};
    use serde_json::json;
    use warden_common::ids::ProjectId;

    const PROJECT: &str = "fbe1fc09-e4cc-4cd2-a51d-c823b40155b2";
    const PROJECT_2: &str = "29885802-c8b9-42d5-806f-6ecc1c943bbb";

    fn scoped_policy(perms: &[&str]) -> ScopingPolicy {
        let project: ProjectId = PROJECT.parse().expect("project");
        ScopingPolicy::new(
            Enforcer::new(perms, "genesis_core").expect("enforcer"),
            Some(project),
            Some("vm".to_string()),
            WardenConfig::default(),
        )
    }

    fn crud() -> ScopingPolicy {
        scoped_policy(&[
            "genesis_core.vm.create",
            "genesis_core.vm.get",
            "genesis_core.vm.update",
            "genesis_core.vm.delete",
        ])
    }

    #[test]
    fn project_scoped_create_and_filter_inject() {
        let guard = ResourceGuard::project_scoped(crud());
        let mut params = Params::new();
        assert_eq!(guard.create(&mut params).expect("create"), ScopeOutcome::Injected);
        assert_eq!(params["project_id"], json!(PROJECT));

        let mut filters = Params::new();
        assert_eq!(guard.filter(&mut filters).expect("filter"), ScopeOutcome::Injected);
        assert_eq!(filters["project_id"], json!(PROJECT));

        let mut params = Params::new();
        assert_eq!(guard.get(&mut params).expect("get"), ScopeOutcome::Injected);
    }

    #[test]
    fn project_scoped_delete_returns_scoped_filters() {
        let guard = ResourceGuard::project_scoped(crud());
        let filters = guard.delete().expect("delete");
        assert_eq!(filters["project_id"], json!(PROJECT));
    }

    #[test]
    fn project_scoped_update_blocks_project_move() {
        let guard = ResourceGuard::project_scoped(crud());
        let filters = guard
            .update(&Params::from_iter([("name".to_string(), json!("renamed"))]))
            .expect("update");
        assert_eq!(filters["project_id"], json!(PROJECT));

        guard
            .update(&Params::from_iter([("project_id".to_string(), json!(PROJECT))]))
            .expect("same project");

        let err = guard
            .update(&Params::from_iter([("project_id".to_string(), json!(PROJECT_2))]))
            .expect_err("moving project");
        assert!(matches!(err, AuthzError::Forbidden { .. }));
    }

    #[test]
    fn unscoped_superuser_update_may_set_any_project() {
        let policy = ScopingPolicy::new(
            Enforcer::new(["*.*.*"], "genesis_core").expect("enforcer"),
            None,
            Some("vm".to_string()),
            WardenConfig::default(),
        );
        let guard = ResourceGuard::project_scoped(policy);
        let filters = guard
            .update(&Params::from_iter([("project_id".to_string(), json!(PROJECT_2))]))
            .expect("superuser");
        assert!(filters.is_empty());
    }

    #[test]
    fn nested_only_enforces() {
        let guard = ResourceGuard::nested(crud());
        let mut params = Params::from_iter([("project_id".to_string(), json!(PROJECT_2))]);
        assert_eq!(guard.create(&mut params).expect("create"), ScopeOutcome::EnforcedOnly);
        assert_eq!(guard.get(&mut params).expect("get"), ScopeOutcome::EnforcedOnly);
        assert_eq!(guard.filter(&mut params).expect("filter"), ScopeOutcome::EnforcedOnly);
        assert_eq!(params["project_id"], json!(PROJECT_2));
        assert!(guard.update(&params).expect("update").is_empty());
        assert!(guard.delete().expect("delete").is_empty());
        assert_eq!(
            guard
                .authorize_in_project(Operation::Get, PROJECT_2)
                .expect("nested get"),
            ScopeOutcome::EnforcedOnly
        );
    }

    #[test]
    fn nested_still_denies() {
        let guard = ResourceGuard::nested(scoped_policy(&["genesis_core.vm.get"]));
        let err = guard.delete().expect_err("denied");
        assert!(matches!(
            err,
            AuthzError::PolicyNotAuthorized { ref permission } if permission == "genesis_core.vm.delete"
        ));
    }

    #[test]
    fn without_project_scopes_create_and_filter_only() {
        let guard = ResourceGuard::without_project(crud());
        let mut params = Params::new();
        assert_eq!(guard.create(&mut params).expect("create"), ScopeOutcome::Injected);
        let mut filters = Params::new();
        assert_eq!(guard.filter(&mut filters).expect("filter"), ScopeOutcome::Injected);

        let mut params = Params::new();
        assert_eq!(guard.get(&mut params).expect("get"), ScopeOutcome::EnforcedOnly);
        assert!(params.is_empty());
        assert!(guard.delete().expect("delete").is_empty());
        assert!(
            guard
                .update(&Params::from_iter([("project_id".to_string(), json!(PROJECT_2))]))
                .expect("update")
                .is_empty()
        );
    }

    #[test]
    fn authorize_in_project_validates() {
        let guard = ResourceGuard::project_scoped(crud());
        assert_eq!(
            guard
                .authorize_in_project(Operation::Delete, PROJECT)
                .expect("own"),
            ScopeOutcome::Validated
        );
        let err = guard
            .authorize_in_project(Operation::Get, PROJECT_2)
            .expect_err("other");
        assert!(matches!(err, AuthzError::Forbidden { .. }));
    }

    #[test]
    fn filter_is_checked_as_get() {
        let guard = ResourceGuard::project_scoped(scoped_policy(&["genesis_core.vm.get"]));
        let mut filters = Params::new();
        guard.filter(&mut filters).expect("filter allowed via get");
        assert_eq!(guard.kind(), ScopeKind::ProjectScoped);
        assert_eq!(guard.policy().policy_name(), Some("vm"));
    }
}
