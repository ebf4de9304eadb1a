use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::string;

use self::raw::RawConfig;

mod raw;

/// the license feature checked out by Prime MM-GBSA jobs
pub const MMGBSA_FEATURE: &str = "PSP_PLOP";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub suite_root: PathBuf,
    pub workers: usize,
    pub license_poll: Duration,
    pub sentinel_poll: Duration,
    pub launch_grace: usize,
    pub license_timeout: Option<Duration>,
    pub job_timeout: Option<Duration>,
    pub progress_every: usize,
    pub license_cmd: Vec<String>,
    pub min_free_seats: usize,
    pub host: Option<String>,
    pub seats: BTreeMap<String, usize>,
    pub mmgbsa: Mmgbsa,
}

/// settings for the Prime MM-GBSA stage
#[derive(Debug, Clone, PartialEq)]
pub struct Mmgbsa {
    pub host: String,
    pub opls: String,
    pub keywords: BTreeMap<String, String>,
}

impl Default for Mmgbsa {
    fn default() -> Self {
        Self {
            host: String::from("localhost:12"),
            opls: String::from("OPLS3e"),
            keywords: BTreeMap::new(),
        }
    }
}

impl Config {
    /// a config with every default filled in for the installation at `root`
    pub fn new(suite_root: impl Into<PathBuf>) -> Self {
        Self {
            suite_root: suite_root.into(),
            workers: 4,
            license_poll: Duration::from_secs(3),
            sentinel_poll: Duration::from_secs(3),
            launch_grace: 10,
            license_timeout: None,
            job_timeout: None,
            progress_every: 4,
            license_cmd: string!["licadmin", "stat"],
            min_free_seats: 1,
            host: None,
            seats: BTreeMap::new(),
            mmgbsa: Mmgbsa::default(),
        }
    }

    pub fn load(filename: &str) -> Result<Self> {
        Self::from_raw(RawConfig::load(filename)?)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let def = Config::new(raw.suite_root);
        let ret = Self {
            workers: raw.workers.unwrap_or(def.workers),
            license_poll: raw
                .license_poll_ms
                .map(Duration::from_millis)
                .unwrap_or(def.license_poll),
            sentinel_poll: raw
                .sentinel_poll_ms
                .map(Duration::from_millis)
                .unwrap_or(def.sentinel_poll),
            launch_grace: raw.launch_grace.unwrap_or(def.launch_grace),
            license_timeout: raw.license_timeout_secs.map(Duration::from_secs),
            job_timeout: raw.job_timeout_secs.map(Duration::from_secs),
            progress_every: raw.progress_every.unwrap_or(def.progress_every),
            license_cmd: raw.license_cmd.unwrap_or(def.license_cmd),
            min_free_seats: raw.min_free_seats.unwrap_or(def.min_free_seats),
            host: raw.host,
            seats: raw.seats,
            mmgbsa: Mmgbsa {
                host: raw.mmgbsa.host.unwrap_or(def.mmgbsa.host),
                opls: raw.mmgbsa.opls.unwrap_or(def.mmgbsa.opls),
                keywords: raw.mmgbsa.keywords,
            },
            suite_root: def.suite_root,
        };
        ret.validate()?;
        Ok(ret)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }
        if self.license_poll.is_zero() || self.sentinel_poll.is_zero() {
            return Err(Error::InvalidConfig(
                "poll intervals must be positive".into(),
            ));
        }
        if self.progress_every == 0 {
            return Err(Error::InvalidConfig(
                "progress_every must be at least 1".into(),
            ));
        }
        if self.license_cmd.is_empty() {
            return Err(Error::InvalidConfig("license_cmd is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full() {
        let got = Config::load("test_files/test.toml").unwrap();
        let want = Config {
            suite_root: PathBuf::from("/opt/schrodinger2022-3"),
            workers: 6,
            license_poll: Duration::from_secs(2),
            sentinel_poll: Duration::from_secs(1),
            launch_grace: 10,
            license_timeout: Some(Duration::from_secs(3600)),
            job_timeout: None,
            progress_every: 4,
            license_cmd: string!["licadmin", "stat"],
            min_free_seats: 1,
            host: Some("node01".to_string()),
            seats: BTreeMap::from([("PSP_PLOP".to_string(), 8)]),
            mmgbsa: Mmgbsa {
                host: "localhost:12".to_string(),
                opls: "OPLS4".to_string(),
                keywords: BTreeMap::from([(
                    "flexible_residues".to_string(),
                    "none".to_string(),
                )]),
            },
        };
        assert_eq!(got, want);
    }

    #[test]
    fn test_zero_workers() {
        let raw = RawConfig {
            suite_root: PathBuf::from("/opt/suite"),
            workers: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Config::from_raw(raw),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_license_cmd() {
        let mut cfg = Config::new("/opt/suite");
        assert!(cfg.validate().is_ok());
        cfg.license_cmd.clear();
        assert!(cfg.validate().is_err());
    }
}
