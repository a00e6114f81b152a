use std::convert::Infallible;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("{0}")]
    Validation(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: unit `{unit}` not found", .path.display())]
    UnitNotFound { path: PathBuf, unit: String },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: still locked after {attempts} attempts", .path.display())]
    Lock { path: PathBuf, attempts: u32 },

    #[error("spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("restore {}: {source}{}", .path.display(), search_suffix(.search_error))]
    Restore {
        path: PathBuf,
        #[source]
        source: Box<ReduceError>,
        search_error: Option<Box<ReduceError>>,
    },
}

impl ReduceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReduceError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<Infallible> for ReduceError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

fn search_suffix(search_error: &Option<Box<ReduceError>>) -> String {
    match search_error {
        Some(err) => format!(" (after search error: {err})"),
        None => String::new(),
    }
}
