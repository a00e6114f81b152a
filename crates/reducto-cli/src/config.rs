use anyhow::{Context, Result};
use reducto_core::{CommandSpec, LockPolicy};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReduceConfig {
    pub build: Option<CommandSpec>,
    pub test: Option<CommandSpec>,
    #[serde(default)]
    pub lock: LockSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockSpec {
    pub retry_interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
}

impl ReduceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: ReduceConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// `None` when the build step is disabled.
    pub fn build_command(&self, enabled: bool, timeout_ms: Option<u64>) -> Option<CommandSpec> {
        if !enabled {
            return None;
        }
        let spec = self.build.clone().unwrap_or_else(CommandSpec::cargo_build);
        Some(with_default_timeout(spec, timeout_ms))
    }

    pub fn test_command(&self, timeout_ms: Option<u64>) -> CommandSpec {
        let spec = self.test.clone().unwrap_or_else(CommandSpec::cargo_test);
        with_default_timeout(spec, timeout_ms)
    }

    pub fn lock_policy(&self) -> LockPolicy {
        let defaults = LockPolicy::default();
        LockPolicy {
            retry_interval: self
                .lock
                .retry_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_interval),
            max_attempts: self.lock.max_attempts.unwrap_or(defaults.max_attempts),
        }
    }
}

fn with_default_timeout(spec: CommandSpec, timeout_ms: Option<u64>) -> CommandSpec {
    if spec.timeout_ms.is_some() {
        return spec;
    }
    spec.with_timeout_ms(timeout_ms)
}
