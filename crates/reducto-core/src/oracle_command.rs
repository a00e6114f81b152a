use crate::error::ReduceError;
use crate::oracle::Oracle;
use crate::process::{run_command, CommandLine, ExitKind, RunOutcome};
use crate::source::SourceAccessor;
use crate::types::{IndeterminateReason, OracleCounters, Outcome, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const LOG_TAIL_BYTES: usize = 2048;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSpec {
    pub cmd: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl CommandSpec {
    pub fn new<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            cwd: None,
            env: BTreeMap::new(),
            timeout_ms: None,
        }
    }

    pub fn cargo_build() -> Self {
        Self::new(["cargo", "build", "--tests", "--manifest-path", "{manifest}"])
    }

    /// Runs exactly the one test, so a sibling whose name merely contains
    /// the unit's name cannot stand in for it.
    pub fn cargo_test() -> Self {
        Self::new([
            "cargo",
            "test",
            "--manifest-path",
            "{manifest}",
            "--",
            "{test_path}",
            "--exact",
        ])
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CommandOracleConfig {
    pub container: PathBuf,
    pub unit: String,
    pub project: PathBuf,
    pub build: Option<CommandSpec>,
    pub test: CommandSpec,
}

/// Stages each candidate into the container, builds, and runs the test.
///
/// A failed or timed-out build and a timed-out test are indeterminate and
/// come back as `Pass`. Only a test that runs to completion and exits
/// non-zero counts as a reproduction.
///
/// Command arguments, `cwd` and env values may use `{container}`, `{unit}`,
/// `{test_path}` (the unit's qualified name), `{project}`, `{project_dir}`
/// and `{manifest}` (`{project}`, or its `Cargo.toml` when it is a
/// directory).
#[derive(Debug)]
pub struct CommandOracle<A> {
    config: CommandOracleConfig,
    accessor: A,
    test_path: String,
    counters: OracleCounters,
}

impl<A> CommandOracle<A>
where
    A: SourceAccessor,
{
    pub fn new(config: CommandOracleConfig, accessor: A) -> Result<Self, ReduceError> {
        for (label, spec) in [("build", config.build.as_ref()), ("test", Some(&config.test))] {
            if let Some(spec) = spec {
                if spec.cmd.is_empty() {
                    return Err(ReduceError::Validation(format!(
                        "{label} command must not be empty"
                    )));
                }
            }
        }
        let test_path = accessor.qualified_name(&config.container, &config.unit)?;
        debug!(test_path = %test_path, "resolved test path");
        Ok(Self {
            config,
            accessor,
            test_path,
            counters: OracleCounters::default(),
        })
    }

    pub fn counters(&self) -> &OracleCounters {
        &self.counters
    }

    pub fn test_path(&self) -> &str {
        &self.test_path
    }

    pub fn observe(&self, candidate: &[A::Element]) -> Result<Outcome, ReduceError> {
        let container = &self.config.container;
        self.accessor
            .write_elements(container, container, &self.config.unit, candidate)?;
        debug!(elements = candidate.len(), "staged candidate");

        if let Some(build) = &self.config.build {
            let command = self.resolve(build);
            info!(command = %command.display(), "building candidate");
            let run = run_command(&command)?;
            match run.exit {
                ExitKind::Exited(0) => {}
                ExitKind::Exited(code) => {
                    info!(code, "build failed, continuing search");
                    log_tail(&run);
                    return Ok(Outcome::Indeterminate(IndeterminateReason::BuildFailed));
                }
                ExitKind::TimedOut => {
                    warn!(elapsed_ms = run.elapsed.as_millis() as u64, "build timed out");
                    return Ok(Outcome::Indeterminate(IndeterminateReason::BuildTimeout));
                }
            }
        }

        let command = self.resolve(&self.config.test);
        info!(command = %command.display(), "running test");
        let run = run_command(&command)?;
        let outcome = match run.exit {
            ExitKind::Exited(0) => {
                info!("test passed, candidate does not reproduce");
                Outcome::NotReproduced
            }
            ExitKind::Exited(code) => {
                info!(code, "test failed, candidate reproduces");
                Outcome::Reproduced
            }
            ExitKind::TimedOut => {
                warn!(elapsed_ms = run.elapsed.as_millis() as u64, "test timed out");
                Outcome::Indeterminate(IndeterminateReason::TestTimeout)
            }
        };
        log_tail(&run);
        Ok(outcome)
    }

    fn resolve(&self, spec: &CommandSpec) -> CommandLine {
        let project_dir = project_dir(&self.config.project);
        let manifest = manifest_path(&self.config.project);
        let substitute = |arg: &str| {
            arg.replace("{container}", &self.config.container.to_string_lossy())
                .replace("{unit}", &self.config.unit)
                .replace("{test_path}", &self.test_path)
                .replace("{project_dir}", &project_dir.to_string_lossy())
                .replace("{project}", &self.config.project.to_string_lossy())
                .replace("{manifest}", &manifest.to_string_lossy())
        };
        let cwd = match &spec.cwd {
            Some(cwd) => {
                let cwd = PathBuf::from(substitute(cwd));
                if cwd.is_absolute() {
                    cwd
                } else {
                    project_dir.join(cwd)
                }
            }
            None => project_dir.clone(),
        };
        CommandLine {
            program: substitute(&spec.cmd[0]),
            args: spec.cmd[1..].iter().map(|arg| substitute(arg)).collect(),
            cwd: Some(cwd),
            env: spec
                .env
                .iter()
                .map(|(key, value)| (key.clone(), substitute(value)))
                .collect(),
            timeout: spec.timeout_ms.map(Duration::from_millis),
        }
    }
}

impl<A> Oracle<A::Element> for CommandOracle<A>
where
    A: SourceAccessor,
{
    type Error = ReduceError;

    fn evaluate(&mut self, candidate: &[A::Element]) -> Result<Verdict, Self::Error> {
        let outcome = self.observe(candidate)?;
        if let Outcome::Indeterminate(reason) = outcome {
            warn!(reason = reason.as_str(), "indeterminate outcome, treating as pass");
        }
        self.counters.record(outcome);
        Ok(outcome.verdict())
    }
}

fn project_dir(project: &Path) -> PathBuf {
    if project.is_dir() {
        return project.to_path_buf();
    }
    match project.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    }
}

fn manifest_path(project: &Path) -> PathBuf {
    if project.is_dir() {
        project.join("Cargo.toml")
    } else {
        project.to_path_buf()
    }
}

fn log_tail(run: &RunOutcome) {
    let tail = run.tail(LOG_TAIL_BYTES);
    if !tail.is_empty() {
        debug!(elapsed_ms = run.elapsed.as_millis() as u64, "{tail}");
    }
}
