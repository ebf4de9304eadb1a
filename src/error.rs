use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{cmd} failed with exit code {code:?}: {stderr}")]
    LaunchFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("empty command line for {dir}")]
    EmptyCommand { dir: PathBuf },

    #[error("license status command failed: {0}")]
    LicenseCommand(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("{failed} of {total} subjobs failed")]
    Subjobs { failed: usize, total: usize },

    #[error("no results to combine in {0}")]
    NoResults(PathBuf),

    #[error("column {column} has {got} values for {want} rows")]
    ColumnLength {
        column: String,
        got: usize,
        want: usize,
    },
}

impl Error {
    /// attach `path` to an io error, for use with `map_err`
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
