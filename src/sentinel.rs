use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::launcher::Launched;

/// how often and for how long to look for sentinel files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    pub interval: Duration,
    /// polls to allow after the launcher exits cleanly with no sentinel
    pub grace: usize,
    pub timeout: Option<Duration>,
}

impl From<&Config> for Poll {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.sentinel_poll,
            grace: config.launch_grace,
            timeout: config.job_timeout,
        }
    }
}

/// The marker file job control keeps in a job directory while the job runs.
/// Its name starts with a dot followed by the local host name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    prefix: String,
}

impl Sentinel {
    pub fn for_host(host: &str) -> Self {
        Self {
            prefix: format!(".{host}"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// report whether any entry in `dir` starts with the sentinel prefix
    pub fn is_present(&self, dir: &Path) -> Result<bool> {
        for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
            let entry = entry.map_err(Error::io(dir))?;
            if entry.file_name().to_string_lossy().starts_with(&self.prefix) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Wait for the sentinel to show up in `dir` and then go away again.
    ///
    /// While waiting for it to appear, the launched process is checked too:
    /// if it exits with a failure the wait ends with [Error::LaunchFailed],
    /// and if it exits cleanly but no sentinel turns up within `poll.grace`
    /// more polls, the job is taken to have finished already.
    pub fn wait(
        &self,
        dir: &Path,
        launched: &mut Launched,
        poll: &Poll,
    ) -> Result<()> {
        let start = Instant::now();
        let what = format!("{} in {}", launched.cmd, dir.display());
        let timed_out = || match poll.timeout {
            Some(limit) if start.elapsed() >= limit => {
                Err(Error::Timeout(what.clone()))
            }
            _ => Ok(()),
        };
        let mut exited = None;
        let mut grace = 0;
        while !self.is_present(dir)? {
            if exited.is_none() {
                exited = launched.try_wait()?;
            }
            if let Some(status) = exited {
                if !status.success() {
                    return Err(Error::LaunchFailed {
                        cmd: launched.cmd.clone(),
                        code: status.code(),
                        stderr: launched.take_stderr().trim().to_string(),
                    });
                }
                if grace >= poll.grace {
                    tracing::warn!(
                        cmd = %launched.cmd,
                        dir = %dir.display(),
                        "launcher exited without a sentinel, assuming done"
                    );
                    return Ok(());
                }
                grace += 1;
            }
            timed_out()?;
            thread::sleep(poll.interval);
        }
        while self.is_present(dir)? {
            timed_out()?;
            thread::sleep(poll.interval);
        }
        Ok(())
    }
}
