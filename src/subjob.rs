use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::utils::ensure_dir;

/// One batch of work for a single worker: the files it owns, the commands to
/// run on them, and the scratch directory the commands run in
#[derive(Debug, Clone, PartialEq)]
pub struct Subjob {
    pub index: usize,
    pub files: Vec<PathBuf>,
    pub cmds: Vec<Vec<String>>,
    pub scratch: PathBuf,
    /// license feature each command checks out, if any
    pub license: Option<String>,
}

impl Subjob {
    pub fn new(index: usize, files: Vec<PathBuf>, scratch: PathBuf) -> Self {
        Self {
            index,
            files,
            cmds: Vec::new(),
            scratch,
            license: None,
        }
    }

    pub fn with_license(mut self, feature: &str) -> Self {
        self.license = Some(feature.to_string());
        self
    }

    pub fn push_cmd(&mut self, argv: Vec<String>) {
        self.cmds.push(argv);
    }

    /// the name used for this subjob in log messages
    pub fn name(&self) -> String {
        self.scratch
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.index.to_string())
    }

    /// copy the input files into the scratch directory, creating it if needed
    pub fn stage(&self) -> Result<()> {
        ensure_dir(&self.scratch)?;
        for file in &self.files {
            let name = file.file_name().ok_or_else(|| Error::Io {
                path: file.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a file",
                ),
            })?;
            let dst = self.scratch.join(name);
            if dst != *file {
                fs::copy(file, &dst).map_err(Error::io(file))?;
            }
        }
        Ok(())
    }

    /// Stage the inputs and run every command in turn. Each command waits for
    /// a free license seat before it is launched and is considered done once
    /// its sentinel has come and gone.
    pub fn run(&self, launcher: &Launcher) -> Result<()> {
        self.stage()?;
        let name = self.name();
        let total = self.cmds.len();
        for (i, argv) in self.cmds.iter().enumerate() {
            if let Some(feature) = &self.license {
                launcher.gate.wait(feature, &name)?;
            }
            let out = launcher.run_cmd(argv, &self.scratch)?;
            if !out.stderr.trim().is_empty() {
                tracing::debug!(
                    subjob = self.index,
                    stderr = %out.stderr.trim(),
                    "command wrote to stderr"
                );
            }
            let done = i + 1;
            if done % launcher.progress_every == 0 {
                tracing::info!(
                    subjob = self.index,
                    "{done}/{total} sub-jobs completed"
                );
            }
        }
        tracing::info!(subjob = self.index, "complete");
        Ok(())
    }
}
