use std::collections::BTreeMap;
use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::suite::Suite;

/// seat counts for a single license feature, as reported by the license server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseStatus {
    pub feature: String,
    pub issued: usize,
    pub in_use: usize,
}

impl LicenseStatus {
    pub fn free(&self) -> usize {
        self.issued.saturating_sub(self.in_use)
    }
}

impl Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<24}{:>8}{:>8}{:>8}",
            self.feature,
            self.issued,
            self.in_use,
            self.free()
        )
    }
}

/// parse the `Users of` lines out of the output of the license status tool.
/// these look like
///
/// ```text
/// Users of PSP_PLOP:  (Total of 40 licenses issued;  Total of 8 licenses in use)
/// ```
///
/// Lines that start with `Users` but don't carry both counts (uncounted or
/// errored features) are skipped.
pub fn parse_status(text: &str) -> Vec<LicenseStatus> {
    let mut ret = Vec::new();
    for line in text.lines().map(str::trim) {
        if !line.starts_with("Users") {
            continue;
        }
        match parse_line(line) {
            Some(s) => ret.push(s),
            None => tracing::warn!(line, "skipping unparseable license line"),
        }
    }
    ret
}

fn parse_line(line: &str) -> Option<LicenseStatus> {
    let (head, _) = line.split_once(':')?;
    let feature = head.split_whitespace().last()?;
    let count = |part: &str| -> Option<usize> {
        part.rsplit("of").next()?.split_whitespace().next()?.parse().ok()
    };
    let issued = count(line.split(';').next()?)?;
    let in_use = count(line.rsplit(';').next()?)?;
    Some(LicenseStatus {
        feature: feature.to_string(),
        issued,
        in_use,
    })
}

pub trait LicenseServer: Send + Sync {
    /// the current seat counts for every feature the server reports
    fn status(&self) -> Result<Vec<LicenseStatus>>;
}

/// queries the license server by running the suite's status command
#[derive(Debug, Clone)]
pub struct LicAdmin {
    suite: Suite,
    cmd: Vec<String>,
}

impl LicAdmin {
    pub fn new(suite: Suite, cmd: Vec<String>) -> Self {
        Self { suite, cmd }
    }
}

impl LicenseServer for LicAdmin {
    fn status(&self) -> Result<Vec<LicenseStatus>> {
        let (program, args) = self
            .cmd
            .split_first()
            .ok_or_else(|| Error::LicenseCommand("empty command".into()))?;
        let output = self
            .suite
            .command(program)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;
        let report = parse_status(&String::from_utf8_lossy(&output.stdout));
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // one unreachable server in a list fails the whole command, but
            // the others still report their seats
            if report.is_empty() {
                return Err(Error::LicenseCommand(format!(
                    "{} exited with {}: {}",
                    self.cmd.join(" "),
                    output.status,
                    stderr.trim()
                )));
            }
            tracing::warn!(
                cmd = %self.cmd.join(" "),
                status = %output.status,
                stderr = %stderr.trim(),
                "license status command failed, using partial report"
            );
        }
        Ok(report)
    }
}

/// Holds jobs back until their license feature has enough free seats
pub struct LicenseGate {
    server: Box<dyn LicenseServer>,
    poll: Duration,
    timeout: Option<Duration>,
    seats: BTreeMap<String, usize>,
    min_free: usize,
}

impl LicenseGate {
    pub fn new(server: Box<dyn LicenseServer>, config: &Config) -> Self {
        Self {
            server,
            poll: config.license_poll,
            timeout: config.license_timeout,
            seats: config.seats.clone(),
            min_free: config.min_free_seats,
        }
    }

    /// the number of free seats `feature` needs before a job can launch
    pub fn required(&self, feature: &str) -> usize {
        self.seats
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(feature))
            .map(|(_, v)| *v)
            .unwrap_or(self.min_free)
    }

    pub fn status(&self) -> Result<Vec<LicenseStatus>> {
        self.server.status()
    }

    /// report whether `feature` currently has enough free seats. features the
    /// server doesn't mention are assumed to be available
    pub fn available(&self, feature: &str, job: &str) -> Result<bool> {
        let need = self.required(feature);
        for s in self.server.status()? {
            if !s.feature.eq_ignore_ascii_case(feature) {
                continue;
            }
            tracing::debug!(
                job,
                feature = %s.feature,
                issued = s.issued,
                in_use = s.in_use,
                "license status"
            );
            if s.free() < need {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// block until `feature` is available, polling the server at the
    /// configured interval. a failed status query counts as no seats yet
    pub fn wait(&self, feature: &str, job: &str) -> Result<()> {
        let start = Instant::now();
        let mut logged = false;
        loop {
            match self.available(feature, job) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(job, feature, "license status: {e}");
                }
            }
            if !logged {
                tracing::info!(job, feature, "waiting for license seats");
                logged = true;
            }
            if let Some(limit) = self.timeout {
                if start.elapsed() >= limit {
                    return Err(Error::Timeout(format!(
                        "{feature} license seats for {job}"
                    )));
                }
            }
            thread::sleep(self.poll);
        }
    }
}
