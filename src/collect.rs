use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::{copy_dir, ensure_dir, list_entries, remove_dir};

/// Empty a structure-preparation scratch directory. Subdirectories and `*log`
/// files go to `logs`, `prep*` files go to `prepped`, and everything else is
/// dropped along with the scratch directory itself. Returns the paths written
/// to `prepped`.
pub fn collect_prep(
    scratch: &Path,
    prepped: &Path,
    logs: &Path,
) -> Result<Vec<PathBuf>> {
    ensure_dir(prepped)?;
    ensure_dir(logs)?;
    let mut ret = Vec::new();
    for name in list_entries(scratch)? {
        let path = scratch.join(&name);
        if path.is_dir() {
            copy_dir(&path, &logs.join(&name))?;
            remove_dir(&path)?;
            continue;
        }
        if name.ends_with("log") {
            let dst = logs.join(&name);
            fs::copy(&path, &dst).map_err(Error::io(&path))?;
        }
        if name.starts_with("prep") {
            let dst = prepped.join(&name);
            fs::copy(&path, &dst).map_err(Error::io(&path))?;
            ret.push(dst);
        }
        fs::remove_file(&path).map_err(Error::io(&path))?;
    }
    remove_dir(scratch)?;
    tracing::debug!(
        scratch = %scratch.display(),
        prepped = ret.len(),
        "collected"
    );
    Ok(ret)
}

/// Move every file in `scratch` into `dest`, overwriting anything already
/// there, then remove `scratch`. Subdirectories are dropped. Returns the paths
/// written.
pub fn collect_all(scratch: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    ensure_dir(dest)?;
    let mut ret = Vec::new();
    for name in list_entries(scratch)? {
        let path = scratch.join(&name);
        if path.is_file() {
            let dst = dest.join(&name);
            fs::copy(&path, &dst).map_err(Error::io(&path))?;
            ret.push(dst);
        }
    }
    remove_dir(scratch)?;
    tracing::debug!(
        scratch = %scratch.display(),
        files = ret.len(),
        "collected"
    );
    Ok(ret)
}
