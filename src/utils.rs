use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// from [StackOverflow](https://stackoverflow.com/a/45145246)
#[macro_export]
macro_rules! string {
    // match a list of expressions separated by comma:
    ($($str:expr),*) => ({
        // create a Vec with this list of expressions,
        // calling String::from on each:
        vec![$(String::from($str),)*] as Vec<String>
    });
}

/// create `dir` unless it already exists
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(Error::io(dir))?;
    }
    Ok(())
}

/// return the names of the regular files directly inside `dir`, sorted
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut ret = Vec::new();
    for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
        let entry = entry.map_err(Error::io(dir))?;
        if entry.path().is_file() {
            ret.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    ret.sort();
    Ok(ret)
}

/// return the sorted names of every entry in `dir`, files and directories
pub fn list_entries(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut ret = fs::read_dir(dir)
        .map_err(Error::io(dir))?
        .map(|e| {
            e.map(|e| e.file_name().to_string_lossy().into_owned())
                .map_err(Error::io(dir))
        })
        .collect::<Result<Vec<_>>>()?;
    ret.sort();
    Ok(ret)
}

/// recursively copy the directory `src` to `dst`
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;
    for entry in fs::read_dir(src).map_err(Error::io(src))? {
        let entry = entry.map_err(Error::io(src))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(Error::io(&from))?;
        }
    }
    Ok(())
}

/// remove `dir` and everything in it, retrying a few times if something is
/// still holding a file open
pub fn remove_dir(dir: &Path) -> Result<()> {
    let mut tries = 0;
    while let Err(e) = fs::remove_dir_all(dir) {
        // assume it's okay if the directory already doesn't exist
        if !dir.exists() {
            return Ok(());
        }
        tries += 1;
        if tries >= 5 {
            return Err(Error::Io {
                path: dir.to_path_buf(),
                source: e,
            });
        }
        tracing::warn!(dir = %dir.display(), error = %e, "retrying removal");
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
    Ok(())
}

/// the file name of `path` without its final extension
pub fn stem(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `name` alongside `path`, in the same parent directory
pub fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent().unwrap_or(path).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string() {
        let got = string!["a", "b"];
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_list_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mae"), "").unwrap();
        fs::write(dir.path().join("a.mae"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        assert_eq!(list_files(dir.path()).unwrap(), string!["a.mae", "b.mae"]);
        assert_eq!(
            list_entries(dir.path()).unwrap(),
            string!["a.mae", "b.mae", "sub"]
        );
    }

    #[test]
    fn test_copy_and_remove_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("nested/x.log"), "hi").unwrap();
        let dst = dir.path().join("dst");
        copy_dir(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("nested/x.log")).unwrap(), "hi");
        remove_dir(&src).unwrap();
        assert!(!src.exists());
        // already gone is fine
        remove_dir(&src).unwrap();
    }

    #[test]
    fn test_stem_and_sibling() {
        assert_eq!(stem("/a/b/lig1.mae"), "lig1");
        assert_eq!(stem("prep_lig1_complex.mae"), "prep_lig1_complex");
        assert_eq!(
            sibling(Path::new("/work/prepped_mae"), "complex"),
            PathBuf::from("/work/complex")
        );
    }
}
