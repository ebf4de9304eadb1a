//! The stages of a screening run. A [Wrapper] remembers which directory the
//! last stage wrote to and which files it produced, so stages can be chained:
//! prepare the raw structures, build protein-ligand complexes from them, then
//! score the complexes or fingerprint their interactions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::{concat_results, retitle, Table};
use crate::collect::{collect_all, collect_prep};
use crate::config::{Config, MMGBSA_FEATURE};
use crate::error::{Error, Result};
use crate::inp::{template, write_inp, Job};
use crate::launcher::Launcher;
use crate::partition::divide;
use crate::queue::{check, Queue};
use crate::string;
use crate::subjob::Subjob;
use crate::utils::{ensure_dir, list_files, sibling, stem};

/// name of the combined MM-GBSA table
pub const MMGBSA_ALL: &str = "mmgbsa_all.csv";

pub struct Wrapper {
    pub config: Config,
    pub launcher: Launcher,
    queue: Queue,
    /// the directory the next stage reads from
    pub path: PathBuf,
    /// the names of the files in `path` the next stage works on
    pub files: Vec<String>,
}

/// the name prepwizard writes the prepared version of `file` to
pub fn prep_out(file: &str) -> String {
    format!("prep_{}.mae", stem(file))
}

fn is_prepped(name: &str) -> bool {
    name.starts_with("prep") && name.ends_with("mae")
}

impl Wrapper {
    /// start from `path`, working on `files` or, if none are given, every
    /// file in `path`
    pub fn new(
        config: Config,
        path: impl AsRef<Path>,
        files: Option<Vec<String>>,
    ) -> Result<Self> {
        let launcher = Launcher::new(&config);
        Self::with_launcher(config, launcher, path, files)
    }

    pub fn with_launcher(
        config: Config,
        launcher: Launcher,
        path: impl AsRef<Path>,
        files: Option<Vec<String>>,
    ) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let path = fs::canonicalize(path).map_err(Error::io(path))?;
        let files = match files {
            Some(f) => f,
            None => list_files(&path)?,
        };
        Ok(Self {
            queue: Queue::new(config.workers)?,
            config,
            launcher,
            path,
            files,
        })
    }

    /// split the current files into one batch per worker, as absolute paths
    fn batches(&self) -> Vec<(Vec<String>, Vec<PathBuf>)> {
        divide(&self.files, self.config.workers)
            .into_iter()
            .map(|names| {
                let paths = names.iter().map(|f| self.path.join(f)).collect();
                (names, paths)
            })
            .collect()
    }

    /// Prepare every structure with prepwizard. Prepared structures end up in
    /// `prepped_mae`, which becomes the new working directory, and logs in
    /// `prepwizard_logs`. With `write_pdb`, PDB copies are also written to
    /// `prepped_pdb`.
    pub fn prep_wizard(&mut self, write_pdb: bool) -> Result<Vec<PathBuf>> {
        tracing::info!(
            files = self.files.len(),
            "starting prepwizard on {} files",
            self.files.len()
        );
        let prepwizard = self.launcher.suite.utility("prepwizard");
        let prepwizard = prepwizard.to_string_lossy();
        let mut subjobs = Vec::new();
        for (i, (names, paths)) in self.batches().into_iter().enumerate() {
            let scratch = self.path.join(format!("prepwizard{i}"));
            let mut sj = Subjob::new(i, paths, scratch);
            for name in &names {
                sj.push_cmd(string![&*prepwizard, name, prep_out(name)]);
            }
            subjobs.push(sj);
        }
        let results = self.queue.drain(&subjobs, &self.launcher);
        tracing::info!("prepwizard complete, cleaning up");

        let prepped = self.path.join("prepped_mae");
        let logs = self.path.join("prepwizard_logs");
        for sj in &subjobs {
            if sj.scratch.is_dir() {
                collect_prep(&sj.scratch, &prepped, &logs)?;
            }
        }
        ensure_dir(&prepped)?;
        check(results)?;

        let mut ret = Vec::new();
        let files: Vec<String> = list_files(&prepped)?
            .into_iter()
            .filter(|f| is_prepped(f))
            .collect();
        if write_pdb {
            tracing::info!("writing PDBs");
            let pdb_dir = self.path.join("prepped_pdb");
            ensure_dir(&pdb_dir)?;
            for f in &files {
                let pdb = pdb_dir.join(format!("{}.pdb", stem(f)));
                self.mae2pdb(&prepped.join(f), &pdb)?;
                ret.push(pdb);
            }
        }
        self.path = prepped;
        self.files = files;
        Ok(ret)
    }

    /// convert the structure file `mae` to PDB format at `pdb`
    pub fn mae2pdb(&self, mae: &Path, pdb: &Path) -> Result<()> {
        let argv = string![
            "pdbconvert",
            "-noindex",
            "-imae",
            mae.to_string_lossy(),
            "-opdb",
            pdb.to_string_lossy()
        ];
        self.launcher.run_sync(&argv, &self.path)?;
        Ok(())
    }

    /// Combine the receptor `protein` with every other file into a complex
    /// named `<stem>_complex.<ext>` in the sibling directory `export_to`,
    /// which becomes the new working directory.
    pub fn complex(
        &mut self,
        protein: &str,
        export_to: &str,
    ) -> Result<Vec<PathBuf>> {
        let export = sibling(&self.path, export_to);
        ensure_dir(&export)?;
        let mut ret = Vec::new();
        for file in &self.files {
            if file == protein {
                continue;
            }
            let ext = Path::new(file)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let out = export.join(format!("{}_complex{ext}", stem(file)));
            let argv = string![
                "structcat",
                "-imae",
                protein,
                file,
                "-omae",
                out.to_string_lossy()
            ];
            self.launcher.run_sync(&argv, &self.path)?;
            ret.push(out);
        }
        tracing::info!(complexes = ret.len(), dir = %export.display(), "built");
        self.path = export;
        self.files = list_files(&self.path)?;
        Ok(ret)
    }

    /// Estimate binding energies for every structure with Prime MM-GBSA.
    /// Results go to the sibling directory `export_to`, which becomes the new
    /// working directory, and are combined into [MMGBSA_ALL] there.
    pub fn prime_mmgbsa(&mut self, export_to: &str) -> Result<Table> {
        let out_dir = sibling(&self.path, export_to);
        ensure_dir(&out_dir)?;
        let mm = &self.config.mmgbsa;
        let mut subjobs = Vec::new();
        for (i, (names, paths)) in self.batches().into_iter().enumerate() {
            let scratch = out_dir.join(format!("primeMMGBSA{i}"));
            ensure_dir(&scratch)?;
            let mut sj =
                Subjob::new(i, paths, scratch).with_license(MMGBSA_FEATURE);
            for name in &names {
                let inp = format!("{}.inp", stem(name));
                write_inp(
                    &template(Job::PrimeMmgbsa, name),
                    &sj.scratch.join(&inp),
                    &mm.keywords,
                )?;
                sj.push_cmd(string![
                    "prime_mmgbsa",
                    "-HOST",
                    &mm.host,
                    "-prime_opt",
                    format!("OPLS_VERSION={}", mm.opls),
                    inp
                ]);
            }
            subjobs.push(sj);
        }
        for sj in &subjobs {
            tracing::info!(subjob = sj.index, jobs = sj.files.len(), "subjob");
        }
        let results = self.queue.drain(&subjobs, &self.launcher);
        tracing::info!("prime MM-GBSA complete, cleaning up");
        for sj in &subjobs {
            if sj.scratch.is_dir() {
                collect_all(&sj.scratch, &out_dir)?;
            }
        }
        check(results)?;
        self.path = out_dir;
        self.files = list_files(&self.path)?;
        concat_results(&self.path, MMGBSA_ALL)
    }

    /// Compute interaction fingerprints for every structure, building
    /// complexes with `protein` first if it is given. Each structure is
    /// copied into a sibling `fingerprint` directory and fingerprinted there;
    /// the first field of each result row is replaced with the structure's
    /// name. Returns the CSVs written.
    pub fn fingerprint(
        &mut self,
        protein: Option<&str>,
    ) -> Result<Vec<PathBuf>> {
        if let Some(protein) = protein {
            self.complex(protein, "complex")?;
        }
        let dir = sibling(&self.path, "fingerprint");
        ensure_dir(&dir)?;
        for file in &self.files {
            let src = self.path.join(file);
            fs::copy(&src, dir.join(file)).map_err(Error::io(&src))?;
        }
        let mut ret = Vec::new();
        for file in &self.files {
            let base = stem(file);
            let out = format!("{base}_fingerprint.csv");
            let argv = string![
                "run",
                "interaction_fingerprints.py",
                "-i",
                file,
                "-ocsv",
                &out
            ];
            let output = self.launcher.run_sync(&argv, &dir)?;
            if !output.stdout.trim().is_empty() {
                tracing::info!(file = %file, "{}", output.stdout.trim());
            }
            if !output.stderr.trim().is_empty() {
                tracing::warn!(file = %file, "{}", output.stderr.trim());
            }
            let out = dir.join(out);
            retitle(&out, &base)?;
            let copied = dir.join(file);
            fs::remove_file(&copied).map_err(Error::io(&copied))?;
            ret.push(out);
        }
        Ok(ret)
    }
}
