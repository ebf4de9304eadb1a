use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// the kinds of keyword input file we know how to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    PrimeMmgbsa,
}

/// the template lines for `job` run on the structure file `mae`
pub fn template(job: Job, mae: &str) -> Vec<String> {
    match job {
        Job::PrimeMmgbsa => vec![
            format!("STRUCT_FILE\t{mae}"),
            String::from("JOB_TYPE\tREAL_MIN"),
            String::from("LCONS\tSMARTS.C"),
        ],
    }
}

/// Write the template `lines` to `out`, followed by one `KEY value ` line for
/// each entry in `extra` with the key upper-cased. the trailing space matches
/// what the suite's own input writer emits
pub fn write_inp(
    lines: &[String],
    out: &Path,
    extra: &BTreeMap<String, String>,
) -> Result<()> {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    for (k, v) in extra {
        body.push_str(&format!("{} {v} \n", k.to_uppercase()));
    }
    let mut f = File::create(out).map_err(Error::io(out))?;
    write!(f, "{body}").map_err(Error::io(out))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_write_inp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("lig1.inp");
        let extra = BTreeMap::from([
            ("flexible_residues".to_string(), "none".to_string()),
            ("frozen".to_string(), "true".to_string()),
        ]);
        write_inp(&template(Job::PrimeMmgbsa, "lig1.mae"), &out, &extra)
            .unwrap();
        let got = fs::read_to_string(&out).unwrap();
        let want = "STRUCT_FILE\tlig1.mae
JOB_TYPE\tREAL_MIN
LCONS\tSMARTS.C
FLEXIBLE_RESIDUES none \nFROZEN true \n";
        assert_eq!(got, want);
    }

    #[test]
    fn test_write_inp_no_extra() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("lig1.inp");
        write_inp(
            &template(Job::PrimeMmgbsa, "lig1.mae"),
            &out,
            &BTreeMap::new(),
        )
        .unwrap();
        let got = fs::read_to_string(&out).unwrap();
        assert_eq!(
            got,
            "STRUCT_FILE\tlig1.mae\nJOB_TYPE\tREAL_MIN\nLCONS\tSMARTS.C\n"
        );
    }
}
