//! Minimal CSV reading and writing for the profile and result tables
//!
//! Fields containing a comma, a double quote or a line break are quoted with
//! inner quotes doubled. Model replies in open mode routinely contain all three.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Quote a field if it needs it
pub fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write one row, terminated by `\n`
pub fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> Result<()> {
    let line = fields
        .iter()
        .map(|field| quote_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line)?;
    Ok(())
}

/// Replace `path` with a table made of `header` and `rows`.
///
/// The table is written next to the target and renamed into place, so an
/// interrupted write leaves the previous snapshot intact.
pub fn write_table<S: AsRef<str>>(path: &Path, header: &[&str], rows: &[Vec<S>]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut f = BufWriter::new(File::create(&tmp_path)?);
        write_row(&mut f, header)?;
        for row in rows {
            write_row(&mut f, row)?;
        }
        f.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// A parsed table: header plus data rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names
    pub header: Vec<String>,
    /// Data rows, each as wide as the header
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Position of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Error unless every name in `expected` is present
    pub fn require_columns(&self, path: &Path, expected: &[&str]) -> Result<Vec<usize>> {
        expected
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    Error::malformed_table(
                        path.display().to_string(),
                        1,
                        format!("missing column '{}'", name),
                    )
                })
            })
            .collect()
    }
}

/// Read a table from disk
pub fn read_table(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path)?;
    parse_table(&content).map_err(|(line, reason)| {
        Error::malformed_table(path.display().to_string(), line, reason)
    })
}

/// Parse CSV text. Errors carry the 1-based line where the problem starts.
pub fn parse_table(content: &str) -> std::result::Result<Table, (usize, String)> {
    let records = parse_records(content)?;
    let mut records = records.into_iter();

    let (_, header) = records
        .next()
        .ok_or_else(|| (1, "missing header row".to_string()))?;

    let mut rows = Vec::new();
    for (line, record) in records {
        if record.len() != header.len() {
            return Err((
                line,
                format!("expected {} fields, found {}", header.len(), record.len()),
            ));
        }
        rows.push(record);
    }

    Ok(Table { header, rows })
}

fn parse_records(content: &str) -> std::result::Result<Vec<(usize, Vec<String>)>, (usize, String)> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push((record_line, std::mem::take(&mut record)));
                }
                record.clear();
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err((record_line, "unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("less than 1500"), "less than 1500");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_parse_quoted_fields_and_line_breaks() {
        let content = "Iteration,Response\n1,\"I'd pick, after thought,\n{4.25}\"\n2,\"{3.00}\"\n";
        let table = parse_table(content).unwrap();
        assert_eq!(table.header, vec!["Iteration", "Response"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "I'd pick, after thought,\n{4.25}");
        assert_eq!(table.rows[1][1], "{3.00}");
    }

    #[test]
    fn test_parse_reports_ragged_rows() {
        let content = "A,B\n1,2\n3\n";
        let (line, reason) = parse_table(content).unwrap_err();
        assert_eq!(line, 3);
        assert!(reason.contains("expected 2 fields"));
    }

    #[test]
    fn test_empty_trailing_cell_survives() {
        let table = parse_table("A,B\nx,\r\n").unwrap();
        assert_eq!(table.rows, vec![vec!["x".to_string(), String::new()]]);
    }

    #[test]
    fn test_write_then_read_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let rows = vec![
            vec!["1".to_string(), "plain".to_string()],
            vec!["2".to_string(), "with \"quotes\", commas".to_string()],
        ];

        write_table(&path, &["Id", "Text"], &rows).unwrap();
        let table = read_table(&path).unwrap();

        assert_eq!(table.rows, rows);
        assert!(!path.with_extension("csv.tmp").exists());
        assert_eq!(table.require_columns(&path, &["Text"]).unwrap(), vec![1]);
        assert!(table.require_columns(&path, &["Missing"]).is_err());
    }
}
