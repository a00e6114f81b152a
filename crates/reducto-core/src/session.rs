use crate::error::ReduceError;
use crate::minimize::{Minimizer, Reduction};
use crate::minimize_ddmin::DdMinimizer;
use crate::oracle::Oracle;
use crate::source::SourceAccessor;
use crate::types::MinimizeStats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const ORIGINAL_DIR: &str = "Original";
const SIMPLIFIED_DIR: &str = "Simplified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub container: PathBuf,
    pub unit: String,
    pub project: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub check_initial: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Minimized,
    NotReproducible,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WrittenFiles {
    pub original: Option<PathBuf>,
    pub simplified: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SessionReport<T> {
    pub status: Status,
    pub original_len: usize,
    pub minimized_len: usize,
    pub stats: Option<MinimizeStats>,
    pub written: WrittenFiles,
    pub elements: Vec<T>,
}

/// One minimization run over a single unit of a container.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Checks the inputs and resolves them to absolute paths. Nothing is
    /// written until [`Session::run`].
    pub fn new(mut config: SessionConfig) -> Result<Self, ReduceError> {
        if config.unit.trim().is_empty() {
            return Err(ReduceError::Validation("unit name must not be empty".to_string()));
        }
        if !config.container.is_file() {
            return Err(ReduceError::Validation(format!(
                "container file doesn't exist: {}",
                config.container.display()
            )));
        }
        if !config.project.exists() {
            return Err(ReduceError::Validation(format!(
                "project doesn't exist: {}",
                config.project.display()
            )));
        }
        config.container = fs::canonicalize(&config.container)
            .map_err(|err| ReduceError::io(&config.container, err))?;
        config.project = fs::canonicalize(&config.project)
            .map_err(|err| ReduceError::io(&config.project, err))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn original_path(&self) -> Option<PathBuf> {
        self.config
            .output_dir
            .as_ref()
            .map(|dir| dir.join(ORIGINAL_DIR).join(self.archive_name()))
    }

    pub fn simplified_path(&self) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => dir.join(SIMPLIFIED_DIR).join(self.archive_name()),
            None => self.config.container.clone(),
        }
    }

    fn archive_name(&self) -> String {
        let file_name = self
            .config
            .container
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}_{}", self.config.unit, file_name)
    }

    pub fn run<A, O>(
        &self,
        accessor: &A,
        oracle: &mut O,
    ) -> Result<SessionReport<A::Element>, ReduceError>
    where
        A: SourceAccessor,
        O: Oracle<A::Element>,
        ReduceError: From<O::Error>,
    {
        self.run_with(&DdMinimizer, accessor, oracle)
    }

    pub fn run_with<M, A, O>(
        &self,
        minimizer: &M,
        accessor: &A,
        oracle: &mut O,
    ) -> Result<SessionReport<A::Element>, ReduceError>
    where
        M: Minimizer,
        A: SourceAccessor,
        O: Oracle<A::Element>,
        ReduceError: From<O::Error>,
    {
        let container = &self.config.container;
        let unit = &self.config.unit;

        let original = accessor.read_elements(container, unit)?;
        info!(
            unit = %unit,
            elements = original.len(),
            container = %container.display(),
            "loaded unit"
        );

        let mut written = WrittenFiles::default();
        if let Some(path) = self.original_path() {
            accessor.write_elements(container, &path, unit, &original)?;
            info!(path = %path.display(), "wrote original snapshot");
            written.original = Some(path);
        }

        let guard = RestoreGuard::new(accessor, container, unit, &original);
        let searched = self.search(minimizer, &original, oracle);
        if let Err(restore_error) = guard.restore() {
            return Err(ReduceError::Restore {
                path: container.clone(),
                source: Box::new(restore_error),
                search_error: searched.err().map(Box::new),
            });
        }
        info!(container = %container.display(), "restored original container");

        let Some(reduction) = searched? else {
            return Ok(SessionReport {
                status: Status::NotReproducible,
                original_len: original.len(),
                minimized_len: original.len(),
                stats: None,
                written,
                elements: original,
            });
        };

        let target = self.simplified_path();
        accessor.write_elements(container, &target, unit, &reduction.elements)?;
        info!(
            path = %target.display(),
            from = original.len(),
            to = reduction.elements.len(),
            "wrote simplified unit"
        );
        written.simplified = Some(target);

        Ok(SessionReport {
            status: Status::Minimized,
            original_len: original.len(),
            minimized_len: reduction.elements.len(),
            stats: Some(reduction.stats),
            written,
            elements: reduction.elements,
        })
    }

    fn search<M, T, O>(
        &self,
        minimizer: &M,
        original: &[T],
        oracle: &mut O,
    ) -> Result<Option<Reduction<T>>, ReduceError>
    where
        M: Minimizer,
        T: Clone,
        O: Oracle<T>,
        ReduceError: From<O::Error>,
    {
        if self.config.check_initial {
            info!("checking that the original input reproduces");
            if !oracle.evaluate(original)?.is_fail() {
                warn!("original input does not reproduce the failure");
                return Ok(None);
            }
        }
        let reduction = minimizer.minimize(original.to_vec(), oracle)?;
        Ok(Some(reduction))
    }
}

/// Puts the original elements back into the container when dropped, unless
/// [`RestoreGuard::restore`] already did.
struct RestoreGuard<'a, A>
where
    A: SourceAccessor,
{
    accessor: &'a A,
    container: &'a Path,
    unit: &'a str,
    original: &'a [A::Element],
    armed: bool,
}

impl<'a, A> RestoreGuard<'a, A>
where
    A: SourceAccessor,
{
    fn new(
        accessor: &'a A,
        container: &'a Path,
        unit: &'a str,
        original: &'a [A::Element],
    ) -> Self {
        Self {
            accessor,
            container,
            unit,
            original,
            armed: true,
        }
    }

    fn write_back(&self) -> Result<(), ReduceError> {
        self.accessor
            .write_elements(self.container, self.container, self.unit, self.original)
    }

    fn restore(mut self) -> Result<(), ReduceError> {
        self.armed = false;
        self.write_back()
    }
}

impl<A> Drop for RestoreGuard<'_, A>
where
    A: SourceAccessor,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.write_back() {
            warn!(container = %self.container.display(), "could not restore container: {err}");
        }
    }
}
