//! # Purpose
//! Demonstrate tenant scoping decisions for three kinds of callers.
//!
//! # What this demo proves
//! - A project-scoped user gets its project injected into create/filter
//!   bodies and is rejected when naming another project.
//! - A scoped admin holding `*.*.*` is still confined to its project.
//! - An unscoped superuser skips scoping entirely.
//!
//! # Flow summary
//! 1. Load configuration from the environment (optional `WARDEN_CONFIG`).
//! 2. Build an engine per caller from fixed introspection payloads.
//! 3. Drive create/filter/get/delete through a project-scoped `vm` guard.
//! 4. Print a summary table and exit non-zero on failure.
use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use warden_authz::{
    AuthzError, AuthzResult, IamEngine, IntrospectionDriver, IntrospectionInfo, Operation, Params,
    ResourceGuard, ScopeOutcome, WardenConfig,
};

const PROJECT_A: &str = "fbe1fc09-e4cc-4cd2-a51d-c823b40155b2";
const PROJECT_B: &str = "29885802-c8b9-42d5-806f-6ecc1c943bbb";
const USER_TOKEN: &str = "token-user";
const ADMIN_TOKEN: &str = "token-scoped-admin";
const ROOT_TOKEN: &str = "token-root";

struct DemoDriver;

impl IntrospectionDriver for DemoDriver {
    fn introspection_info(&self, token: &str) -> AuthzResult<Option<IntrospectionInfo>> {
        let payload = match token {
            USER_TOKEN => json!({
                "project_id": PROJECT_A,
                "permissions": ["genesis_core.vm.create", "genesis_core.vm.get"]
            }),
            ADMIN_TOKEN => json!({
                "project_id": PROJECT_A,
                "permissions": ["*.*.*"]
            }),
            ROOT_TOKEN => json!({
                "project_id": "",
                "permissions": ["*.*.*"]
            }),
            _ => return Ok(None),
        };
        serde_json::from_value(payload).map(Some).map_err(|err| {
            tracing::warn!(error = %err, "unreadable introspection payload");
            AuthzError::Unauthorized
        })
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut report = DemoReport::new();
    let result = run_demo(&mut report);
    report.print_summary();
    result
}

fn run_demo(report: &mut DemoReport) -> Result<()> {
    println!("== Warden Demo: Tenant Scoping ==");

    let config = WardenConfig::from_env_or_yaml().context("load warden config")?;
    tracing::info!(prefix = %config.policy_prefix, tenant_key = %config.tenant_key, "config loaded");
    let tenant_key = config.tenant_key.clone();

    let anonymous = IamEngine::new("token-unknown", &DemoDriver, config.clone()).map(|_| ());
    report.check_op("STEP 0 unknown token rejected", anonymous, false)?;

    let user = guard_for(USER_TOKEN, &config)?;
    let mut body = Params::new();
    let outcome = user.create(&mut body).context("user create")?;
    report.check_outcome("STEP 1 user create injects project", outcome, ScopeOutcome::Injected)?;
    report.pass(
        "STEP 1 injected body",
        serde_json::Value::Object(body).to_string(),
    );

    let mut body = Params::from_iter([(tenant_key.clone(), json!(PROJECT_B))]);
    report.check_op(
        "STEP 2 user create in foreign project",
        user.create(&mut body).map(|_| ()),
        false,
    )?;
    report.check_op("STEP 3 user delete without grant", user.delete().map(|_| ()), false)?;

    let admin = guard_for(ADMIN_TOKEN, &config)?;
    report.check_op(
        "STEP 4 scoped admin get own project",
        admin
            .authorize_in_project(Operation::Get, PROJECT_A)
            .map(|_| ()),
        true,
    )?;
    report.check_op(
        "STEP 5 scoped admin delete foreign project",
        admin
            .authorize_in_project(Operation::Delete, PROJECT_B)
            .map(|_| ()),
        false,
    )?;

    let root = guard_for(ROOT_TOKEN, &config)?;
    let mut filters = Params::new();
    let outcome = root.filter(&mut filters).context("root filter")?;
    report.check_outcome("STEP 6 superuser filter unscoped", outcome, ScopeOutcome::Skipped)?;
    let outcome = root
        .authorize_in_project(Operation::Delete, PROJECT_B)
        .context("root delete")?;
    report.check_outcome("STEP 7 superuser delete any project", outcome, ScopeOutcome::Skipped)?;

    Ok(())
}

fn guard_for(token: &str, config: &WardenConfig) -> Result<ResourceGuard> {
    let engine = IamEngine::new(token, &DemoDriver, config.clone())
        .with_context(|| format!("build engine for {token}"))?;
    Ok(ResourceGuard::project_scoped(engine.scoping_policy(Some("vm"))))
}

struct DemoReport {
    steps: Vec<DemoStep>,
}

struct DemoStep {
    label: String,
    status: String,
}

impl DemoReport {
    fn new() -> Self {
        Self { steps: Vec::new() }
    }

    fn pass(&mut self, label: &str, detail: impl Into<String>) {
        let detail = detail.into();
        let status = if detail.is_empty() {
            "PASS".to_string()
        } else {
            format!("PASS ({detail})")
        };
        println!("{label}: {status}");
        self.steps.push(DemoStep {
            label: label.to_string(),
            status,
        });
    }

    fn fail(&mut self, label: &str, status: String) -> Result<()> {
        println!("{label}: {status}");
        self.steps.push(DemoStep {
            label: label.to_string(),
            status,
        });
        bail!("{label} failed")
    }

    fn check_outcome(
        &mut self,
        label: &str,
        actual: ScopeOutcome,
        expected: ScopeOutcome,
    ) -> Result<()> {
        if actual == expected {
            self.pass(label, format!("outcome={actual:?}"));
            Ok(())
        } else {
            self.fail(label, format!("FAIL (outcome={actual:?}, expected={expected:?})"))
        }
    }

    fn check_op(&mut self, label: &str, result: AuthzResult<()>, expect_ok: bool) -> Result<()> {
        match (result, expect_ok) {
            (Ok(()), true) => {
                self.pass(label, "status=OK");
                Ok(())
            }
            (Err(err), false) => {
                self.pass(label, format!("denied: {err}"));
                Ok(())
            }
            (Ok(()), false) => self.fail(label, "FAIL (expected denied)".to_string()),
            (Err(err), true) => self.fail(label, format!("FAIL ({err})")),
        }
    }

    fn print_summary(&self) {
        println!();
        println!("== Summary ==");
        let width = self
            .steps
            .iter()
            .map(|step| step.label.len())
            .max()
            .unwrap_or(0);
        for step in &self.steps {
            println!("{:<width$}  {}", step.label, step.status, width = width);
        }
    }
}
