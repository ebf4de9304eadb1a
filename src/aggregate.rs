use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::{list_files, stem};

/// the column added to combined results to say which structure each row came
/// from
pub const TITLE: &str = "title";

/// An in-memory CSV table. Cells are kept as the text the tools wrote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// read the CSV at `path`. short rows are padded with empty cells and
    /// long ones truncated to the header length
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        let headers: Vec<String> =
            rdr.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let mut row: Vec<String> =
                record?.iter().map(String::from).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// the values in column `name`, if there is one
    pub fn values(&self, name: &str) -> Option<Vec<&str>> {
        let i = self.column(name)?;
        Some(self.rows.iter().map(|r| r[i].as_str()).collect())
    }

    /// Stack `tables` on top of each other. The result has the union of their
    /// columns in the order they are first seen, and cells a table doesn't
    /// have are left empty
    pub fn concat<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Self {
        let tables: Vec<&Table> = tables.into_iter().collect();
        let mut headers: Vec<String> = Vec::new();
        for t in &tables {
            for h in &t.headers {
                if !headers.contains(h) {
                    headers.push(h.clone());
                }
            }
        }
        let mut rows = Vec::new();
        for t in &tables {
            let map: Vec<Option<usize>> =
                headers.iter().map(|h| t.column(h)).collect();
            for row in &t.rows {
                rows.push(
                    map.iter()
                        .map(|i| i.map(|i| row[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
        }
        Self { headers, rows }
    }

    /// fill column `name` with `values`, one per row, replacing the column in
    /// place if it exists and appending it otherwise
    pub fn set_column(
        &mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::ColumnLength {
                column: name.to_string(),
                got: values.len(),
                want: self.rows.len(),
            });
        }
        match self.column(name) {
            Some(i) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[i] = v;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(())
    }

    /// write the table to `path`. with `index`, each row is preceded by its
    /// row number under an unnamed column
    pub fn write(&self, path: impl AsRef<Path>, index: bool) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path.as_ref())?;
        let mut header = Vec::with_capacity(self.headers.len() + 1);
        if index {
            header.push(String::new());
        }
        header.extend(self.headers.iter().cloned());
        wtr.write_record(&header)?;
        for (i, row) in self.rows.iter().enumerate() {
            if index {
                wtr.write_field(i.to_string())?;
            }
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(Error::io(path.as_ref()))?;
        Ok(())
    }
}

/// The structure name behind a result file: everything before `complex` minus
/// the separator in front of it, so `prep_lig1_complex-out.csv` becomes
/// `prep_lig1`. Names without `complex` just lose their extension
pub fn title(file_name: &str) -> String {
    match file_name.split_once("complex") {
        Some((head, _)) => {
            let mut chars = head.chars();
            chars.next_back();
            chars.as_str().to_string()
        }
        None => stem(file_name),
    }
}

/// Combine every CSV in `dir` except `out_name` into one table with a
/// [TITLE] column, write it to `dir/out_name`, and return it. Files without
/// any rows are skipped.
pub fn concat_results(dir: &Path, out_name: &str) -> Result<Table> {
    let mut tables = Vec::new();
    let mut titles = Vec::new();
    for name in list_files(dir)? {
        if name == out_name || !name.ends_with("csv") {
            continue;
        }
        let table = Table::read(dir.join(&name))?;
        if table.is_empty() {
            tracing::warn!(file = %name, "no rows, skipping");
            continue;
        }
        let t = title(&name);
        titles.extend(std::iter::repeat(t).take(table.len()));
        tables.push(table);
    }
    if tables.is_empty() {
        return Err(Error::NoResults(dir.to_path_buf()));
    }
    let mut ret = Table::concat(&tables);
    ret.set_column(TITLE, titles)?;
    let out: PathBuf = dir.join(out_name);
    ret.write(&out, true)?;
    tracing::info!(
        files = tables.len(),
        rows = ret.len(),
        out = %out.display(),
        "combined results"
    );
    Ok(ret)
}

/// Replace the first field on the second line of the CSV at `path` with
/// `title`
pub fn retitle(path: &Path, title: &str) -> Result<()> {
    let contents = fs::read_to_string(path).map_err(Error::io(path))?;
    if contents.split_inclusive('\n').nth(1).is_none() {
        return Err(Error::NoResults(path.to_path_buf()));
    }
    let mut out = String::with_capacity(contents.len() + title.len());
    for (i, line) in contents.split_inclusive('\n').enumerate() {
        if i != 1 {
            out.push_str(line);
            continue;
        }
        out.push_str(title);
        match line.split_once(',') {
            Some((_, rest)) => {
                out.push(',');
                out.push_str(rest);
            }
            None if line.ends_with('\n') => out.push('\n'),
            None => (),
        }
    }
    fs::write(path, out).map_err(Error::io(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string;

    #[test]
    fn test_title() {
        assert_eq!(title("prep_lig1_complex-out.csv"), "prep_lig1");
        assert_eq!(title("lig2-complex-out.csv"), "lig2");
        assert_eq!(title("lig3-out.csv"), "lig3-out");
    }

    #[test]
    fn test_read() {
        let got = Table::read("test_files/mmgbsa/prep_lig1_complex-out.csv")
            .unwrap();
        assert_eq!(
            got.headers,
            string![
                "title",
                "r_psp_MMGBSA_dG_Bind",
                "r_psp_MMGBSA_dG_Bind_Coulomb"
            ]
        );
        assert_eq!(got.len(), 1);
        assert_eq!(got.values("r_psp_MMGBSA_dG_Bind").unwrap(), ["-45.12"]);
    }

    #[test]
    fn test_concat_union() {
        let a = Table {
            headers: string!["x", "y"],
            rows: vec![string!["1", "2"]],
        };
        let b = Table {
            headers: string!["y", "z"],
            rows: vec![string!["3", "4"], string!["5", "6"]],
        };
        let got = Table::concat([&a, &b]);
        let want = Table {
            headers: string!["x", "y", "z"],
            rows: vec![
                string!["1", "2", ""],
                string!["", "3", "4"],
                string!["", "5", "6"],
            ],
        };
        assert_eq!(got, want);
    }

    #[test]
    fn test_set_column() {
        let mut t = Table {
            headers: string!["title", "e"],
            rows: vec![string!["a", "1"], string!["b", "2"]],
        };
        t.set_column("title", string!["x", "y"]).unwrap();
        t.set_column("n", string!["3", "4"]).unwrap();
        assert_eq!(t.headers, string!["title", "e", "n"]);
        assert_eq!(
            t.rows,
            vec![string!["x", "1", "3"], string!["y", "2", "4"]]
        );
    }

    #[test]
    fn test_set_column_wrong_length() {
        let mut t = Table {
            headers: string!["e"],
            rows: vec![string!["1"], string!["2"]],
        };
        let got = t.set_column("n", string!["3"]);
        assert!(matches!(
            got,
            Err(Error::ColumnLength { got: 1, want: 2, .. })
        ));
        assert_eq!(t.headers, string!["e"]);
    }

    #[test]
    fn test_concat_row_count() {
        let tables: Vec<Table> = (0..6)
            .map(|n| Table {
                headers: string!["e"],
                rows: (0..n).map(|i| vec![i.to_string()]).collect(),
            })
            .collect();
        let got = Table::concat(&tables);
        let want: usize = tables.iter().map(Table::len).sum();
        assert_eq!(got.len(), want);
    }

    #[test]
    fn test_concat_results() {
        let dir = tempfile::tempdir().unwrap();
        for name in crate::utils::list_files("test_files/mmgbsa").unwrap() {
            fs::copy(
                Path::new("test_files/mmgbsa").join(&name),
                dir.path().join(&name),
            )
            .unwrap();
        }
        let got = concat_results(dir.path(), "mmgbsa_all.csv").unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(
            got.values(TITLE).unwrap(),
            ["prep_lig1", "prep_lig2"]
        );
        let written = fs::read_to_string(dir.path().join("mmgbsa_all.csv"))
            .unwrap();
        let want = "\
,title,r_psp_MMGBSA_dG_Bind,r_psp_MMGBSA_dG_Bind_Coulomb
0,prep_lig1,-45.12,-12.5
1,prep_lig2,-38.7,-9.25
";
        assert_eq!(written, want);

        // a second run ignores its own output
        let again = concat_results(dir.path(), "mmgbsa_all.csv").unwrap();
        assert_eq!(again, got);
    }

    #[test]
    fn test_concat_results_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_complex-out.csv"), "x,y\n").unwrap();
        assert!(matches!(
            concat_results(dir.path(), "all.csv"),
            Err(Error::NoResults(_))
        ));
    }

    #[test]
    fn test_retitle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c_fingerprint.csv");
        fs::write(&path, "Title,A,B\nentry 1,1,0\n").unwrap();
        retitle(&path, "c").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Title,A,B\nc,1,0\n");
    }
}
