use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// directories under the installation root that hold executables
static PROGRAM_DIRS: &[&str] = &["unxutils", "utilities", "tools"];

/// An installation of the modeling suite: where its executables live and the
/// environment they need to run
#[derive(Debug, Clone)]
pub struct Suite {
    pub root: PathBuf,
    pub host: String,
    path: OsString,
}

impl Suite {
    /// set up the suite at `root`. if `host` is not given, fall back on
    /// [local_host]
    pub fn new(root: impl Into<PathBuf>, host: Option<String>) -> Self {
        let root = root.into();
        let mut dirs = vec![root.clone()];
        dirs.extend(PROGRAM_DIRS.iter().map(|d| root.join(d)));
        let mut paths: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        paths.extend(dirs);
        // only fails if one of the paths contains the separator, in which
        // case the inherited PATH is the best we can do
        let path = std::env::join_paths(paths)
            .unwrap_or_else(|_| std::env::var_os("PATH").unwrap_or_default());
        Self {
            root,
            host: host.unwrap_or_else(local_host),
            path,
        }
    }

    /// the `PATH` handed to child processes
    pub fn path_var(&self) -> &OsString {
        &self.path
    }

    /// a [Command] for `program` with the suite directories on its `PATH`
    pub fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("PATH", &self.path);
        cmd
    }

    /// the full path to the executable `name` in the utilities directory
    pub fn utility(&self, name: &str) -> PathBuf {
        let exe = if cfg!(windows) {
            format!("{name}.exe")
        } else {
            name.to_string()
        };
        self.root.join("utilities").join(exe)
    }
}

/// the name of this machine. `COMPUTERNAME` wins when it is set, as it is on
/// Windows, otherwise ask the OS
pub fn local_host() -> String {
    if let Ok(name) = std::env::var("COMPUTERNAME") {
        if !name.is_empty() {
            return name;
        }
    }
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        String::from("localhost")
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_contains_program_dirs() {
        let suite = Suite::new("/opt/suite", Some("node01".into()));
        let paths: Vec<PathBuf> =
            std::env::split_paths(suite.path_var()).collect();
        for dir in ["/opt/suite", "/opt/suite/utilities", "/opt/suite/tools"] {
            assert!(paths.contains(&PathBuf::from(dir)), "missing {dir}");
        }
        assert_eq!(suite.host, "node01");
    }

    #[test]
    fn test_utility() {
        let suite = Suite::new("/opt/suite", Some("h".into()));
        let got = suite.utility("prepwizard");
        assert!(got.starts_with("/opt/suite/utilities"));
        assert_eq!(
            got.file_stem().unwrap().to_string_lossy(),
            "prepwizard"
        );
    }

    #[test]
    fn test_local_host() {
        assert!(!local_host().is_empty());
    }
}
