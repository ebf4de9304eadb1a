//! Launching suite executables and waiting for them to finish.
//!
//! Most suite tools hand their work off to a job-control daemon and return
//! right away, so the exit of the launched process says little about when the
//! work is done. Instead the daemon keeps a sentinel file named after the
//! local host in the job directory for as long as the job runs, and
//! [Launcher::run_cmd] waits for that file to come and go. Simple converters
//! that do their work in the foreground go through [Launcher::run_sync].

use std::io::Read;
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::license::{LicAdmin, LicenseGate, LicenseServer};
use crate::sentinel::{Poll, Sentinel};
use crate::suite::Suite;

/// what a finished command wrote to its standard streams
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CmdOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A running child process whose output pipes are drained on background
/// threads so a chatty tool can never block on a full pipe
pub struct Launched {
    pub(crate) cmd: String,
    child: Child,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl Launched {
    /// check whether the process has exited without blocking
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_wait()
            .map_err(|source| Error::Spawn {
                program: self.cmd.clone(),
                source,
            })
    }

    /// collect what the process wrote to stderr. only call this once the
    /// process has exited, or it will block until it does
    pub fn take_stderr(&mut self) -> String {
        join(self.stderr.take())
    }

    /// wait for the process to exit and collect everything it wrote
    pub fn finish(mut self) -> Result<CmdOutput> {
        let status = self.child.wait().map_err(|source| Error::Spawn {
            program: self.cmd.clone(),
            source,
        })?;
        Ok(CmdOutput {
            code: status.code(),
            stdout: join(self.stdout.take()),
            stderr: join(self.stderr.take()),
        })
    }

    /// like [Self::finish] but turn an unsuccessful exit into an error
    pub fn finish_ok(self) -> Result<CmdOutput> {
        let cmd = self.cmd.clone();
        let out = self.finish()?;
        if out.code != Some(0) {
            return Err(Error::LaunchFailed {
                cmd,
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }
}

/// Everything a worker needs to get a command through the license gate, onto
/// the machine, and back out again
pub struct Launcher {
    pub suite: Suite,
    pub gate: LicenseGate,
    pub sentinel: Sentinel,
    pub poll: Poll,
    pub progress_every: usize,
}

impl Launcher {
    /// a launcher that asks the real license server for seat counts
    pub fn new(config: &Config) -> Self {
        let suite = Suite::new(&config.suite_root, config.host.clone());
        let server = LicAdmin::new(suite.clone(), config.license_cmd.clone());
        Self::with_server(config, suite, Box::new(server))
    }

    pub fn with_server(
        config: &Config,
        suite: Suite,
        server: Box<dyn LicenseServer>,
    ) -> Self {
        Self {
            sentinel: Sentinel::for_host(&suite.host),
            gate: LicenseGate::new(server, config),
            poll: Poll::from(config),
            progress_every: config.progress_every,
            suite,
        }
    }

    /// start `argv` with `dir` as its working directory
    pub fn spawn(&self, argv: &[String], dir: &Path) -> Result<Launched> {
        let (program, args) =
            argv.split_first().ok_or_else(|| Error::EmptyCommand {
                dir: dir.to_path_buf(),
            })?;
        let cmd = argv.join(" ");
        tracing::debug!(cmd = %cmd, dir = %dir.display(), "launching");
        let mut child = self
            .suite
            .command(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;
        Ok(Launched {
            stdout: drain(child.stdout.take()),
            stderr: drain(child.stderr.take()),
            cmd,
            child,
        })
    }

    /// launch `argv` in `dir`, wait for its sentinel to appear and then
    /// disappear, and return whatever it printed
    pub fn run_cmd(&self, argv: &[String], dir: &Path) -> Result<CmdOutput> {
        let mut launched = self.spawn(argv, dir)?;
        self.sentinel.wait(dir, &mut launched, &self.poll)?;
        launched.finish()
    }

    /// run a foreground tool in `dir` to completion
    pub fn run_sync(&self, argv: &[String], dir: &Path) -> Result<CmdOutput> {
        self.spawn(argv, dir)?.finish_ok()
    }
}
