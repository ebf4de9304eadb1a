use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// deserialize into this before filling in defaults and validating into a
/// real [Config](super::Config)
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    /// root of the suite installation, the `SCHRODINGER` directory
    pub suite_root: PathBuf,

    /// the number of subjobs to run at one time. the input files are split
    /// into this many batches
    pub workers: Option<usize>,

    /// the time in milliseconds to sleep between license status checks
    pub license_poll_ms: Option<u64>,

    /// the time in milliseconds to sleep between checks for the sentinel file
    pub sentinel_poll_ms: Option<u64>,

    /// the number of sentinel polls to allow after a launcher exits cleanly
    /// without the sentinel ever showing up
    pub launch_grace: Option<usize>,

    /// give up waiting for license seats after this many seconds
    pub license_timeout_secs: Option<u64>,

    /// give up waiting for a single command after this many seconds
    pub job_timeout_secs: Option<u64>,

    /// log subjob progress every this many commands
    pub progress_every: Option<usize>,

    /// the license status command and its arguments
    pub license_cmd: Option<Vec<String>>,

    /// free seats a feature needs before launching, unless overridden in
    /// `seats`
    pub min_free_seats: Option<usize>,

    /// host name used for the sentinel prefix
    pub host: Option<String>,

    /// per-feature minimum free seats
    #[serde(default)]
    pub seats: BTreeMap<String, usize>,

    #[serde(default)]
    pub mmgbsa: RawMmgbsa,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub(super) struct RawMmgbsa {
    /// value for the `-HOST` flag
    pub host: Option<String>,

    /// force field version passed through `-prime_opt`
    pub opls: Option<String>,

    /// extra keywords appended to every input file
    #[serde(default)]
    pub keywords: BTreeMap<String, String>,
}

impl RawConfig {
    pub fn load(filename: &str) -> Result<Self> {
        let contents =
            std::fs::read_to_string(filename).map_err(Error::io(filename))?;
        Ok(toml::from_str(&contents)?)
    }
}
