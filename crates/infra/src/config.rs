//! Configuration loading and representation.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use bazaar_auth::AccessPolicy;
use bazaar_workflow::BusinessSettings;

pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub settings: BusinessSettings,
    /// Read-only degradation: every `view*` action is allowed.
    pub safe_mode: bool,
    /// Upper bound on waiting for the workflow role registry.
    pub registry_timeout_ms: u64,
    /// Also require the catalog permission for each transition.
    pub enforce_access_policy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings: BusinessSettings::default(),
            safe_mode: false,
            registry_timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
            enforce_access_policy: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `BAZAAR_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            settings: BusinessSettings {
                enforce_unique_signers: parse_var(
                    &lookup,
                    "BAZAAR_ENFORCE_UNIQUE_SIGNERS",
                    defaults.settings.enforce_unique_signers,
                ),
                single_assignee_per_role: parse_var(
                    &lookup,
                    "BAZAAR_SINGLE_ASSIGNEE",
                    defaults.settings.single_assignee_per_role,
                ),
            },
            safe_mode: parse_var(&lookup, "BAZAAR_SAFE_MODE", defaults.safe_mode),
            registry_timeout_ms: parse_var(
                &lookup,
                "BAZAAR_REGISTRY_TIMEOUT_MS",
                defaults.registry_timeout_ms,
            ),
            enforce_access_policy: parse_var(
                &lookup,
                "BAZAAR_ENFORCE_ACCESS",
                defaults.enforce_access_policy,
            ),
        }
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_millis(self.registry_timeout_ms)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + core::fmt::Debug,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(var = name, value = %raw, ?default, "unparsable setting; using default");
            default
        }
    }
}

/// Read the permission store (`AppPermissions`) from a JSON file.
pub fn load_access_policy(path: impl AsRef<Path>) -> anyhow::Result<AccessPolicy> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading access policy from {}", path.display()))?;
    AccessPolicy::from_json(&raw)
        .with_context(|| format!("parsing access policy in {}", path.display()))
}

/// Read an [`EngineConfig`] from a JSON file; missing fields keep their defaults.
pub fn load_engine_config(path: impl AsRef<Path>) -> anyhow::Result<EngineConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading engine config from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing engine config in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use bazaar_auth::{Permission, Role, SalesAction, User};
    use bazaar_core::UserId;
    use bazaar_workflow::WorkflowRoleKey;

    use super::*;
    use crate::role_directory::SharedRoleRegistry;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_and_bad_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BAZAAR_ENFORCE_UNIQUE_SIGNERS", "false"),
            ("BAZAAR_SAFE_MODE", "true"),
            ("BAZAAR_REGISTRY_TIMEOUT_MS", "not-a-number"),
        ]));
        assert!(!config.settings.enforce_unique_signers);
        assert!(config.safe_mode);
        assert_eq!(config.registry_timeout_ms, DEFAULT_REGISTRY_TIMEOUT_MS);
        assert!(!config.enforce_access_policy);
    }

    #[test]
    fn single_assignee_variable_reaches_the_registry() {
        let config = EngineConfig::from_lookup(lookup(&[("BAZAAR_SINGLE_ASSIGNEE", "true")]));
        assert!(config.settings.single_assignee_per_role);

        let registry = SharedRoleRegistry::from_config(&config);
        let owner = User::new("Olu", Role::Owner);
        registry.assign(WorkflowRoleKey::CashVerifier, UserId::new(), &owner).unwrap();
        assert!(registry.assign(WorkflowRoleKey::CashVerifier, UserId::new(), &owner).is_err());
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn loads_policy_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "role_permissions": {{ "staff": {{ "SALES": {{ "Create_Sale": true }} }} }} }}"#
        )
        .unwrap();

        let policy = load_access_policy(file.path()).unwrap();
        let staff = policy.role_map().and_then(|m| m.get(&Role::Staff)).unwrap();
        assert_eq!(staff.get(Permission::Sales(SalesAction::CreateSale)), Some(true));
    }

    #[test]
    fn missing_files_carry_the_path_in_the_error() {
        let err = load_access_policy("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn partial_engine_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "safe_mode": true }}"#).unwrap();
        let config = load_engine_config(file.path()).unwrap();
        assert!(config.safe_mode);
        assert_eq!(config.registry_timeout_ms, DEFAULT_REGISTRY_TIMEOUT_MS);
        assert!(config.settings.enforce_unique_signers);
    }
}
