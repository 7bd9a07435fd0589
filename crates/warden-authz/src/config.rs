use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

pub const DEFAULT_SERVICE: &str = "genesis_core";
pub const DEFAULT_POLICY_PREFIX: &str = "genesis_core";
pub const DEFAULT_TENANT_KEY: &str = "project_id";
pub const DEFAULT_PERMISSION: &str = "default";

// Enforcement settings sourced from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenConfig {
    // Service used when a check does not name one.
    pub default_service: String,
    // Leading segment of every per-domain policy key.
    pub policy_prefix: String,
    // Parameter key carrying the tenant identifier.
    pub tenant_key: String,
    // Permission required by guards with no policy domain.
    pub default_permission: String,
}

#[derive(Debug, Deserialize)]
struct WardenConfigOverride {
    default_service: Option<String>,
    policy_prefix: Option<String>,
    tenant_key: Option<String>,
    default_permission: Option<String>,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            default_service: DEFAULT_SERVICE.to_string(),
            policy_prefix: DEFAULT_POLICY_PREFIX.to_string(),
            tenant_key: DEFAULT_TENANT_KEY.to_string(),
            default_permission: DEFAULT_PERMISSION.to_string(),
        }
    }
}

impl WardenConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            default_service: env_or("WARDEN_DEFAULT_SERVICE", defaults.default_service),
            policy_prefix: env_or("WARDEN_POLICY_PREFIX", defaults.policy_prefix),
            tenant_key: env_or("WARDEN_TENANT_KEY", defaults.tenant_key),
            default_permission: env_or("WARDEN_DEFAULT_PERMISSION", defaults.default_permission),
        };
        config.validate().with_context(|| "validate warden env config")?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            let override_cfg: WardenConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse warden config yaml")?;
            if let Some(value) = override_cfg.default_service {
                config.default_service = value;
            }
            if let Some(value) = override_cfg.policy_prefix {
                config.policy_prefix = value;
            }
            if let Some(value) = override_cfg.tenant_key {
                config.tenant_key = value;
            }
            if let Some(value) = override_cfg.default_permission {
                config.default_permission = value;
            }
            config
                .validate()
                .with_context(|| format!("validate WARDEN_CONFIG: {path}"))?;
        }
        Ok(config)
    }

    fn validate(&self) -> warden_common::Result<()> {
        for (name, value) in [
            ("default_service", &self.default_service),
            ("policy_prefix", &self.policy_prefix),
            ("tenant_key", &self.tenant_key),
            ("default_permission", &self.default_permission),
        ] {
            if value.trim().is_empty() {
                return Err(warden_common::Error::Config(format!("{name} must not be empty")));
            }
        }
        // Prefix and service become permission segments.
        for (name, value) in [
            ("default_service", &self.default_service),
            ("policy_prefix", &self.policy_prefix),
        ] {
            if value.contains('.') {
                return Err(warden_common::Error::Config(format!(
                    "{name} must not contain '.'"
                )));
            }
        }
        Ok(())
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
