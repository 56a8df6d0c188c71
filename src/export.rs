//! Result table export
//!
//! File layout:
//!
//! ```text
//! # <comment>
//! Filename,Prediction,Actual,Correct?
//! cat.1.jpg,cat,cat,True
//! ```

use crate::core::{Result, SVMError};
use crate::data::labels::{label_from_name, label_name};
use crate::evaluation::{ResultRow, ResultTable};
use log::info;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

const HEADER: [&str; 4] = ["Filename", "Prediction", "Actual", "Correct?"];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Filename")]
    filename: String,
    #[serde(rename = "Prediction")]
    prediction: String,
    #[serde(rename = "Actual")]
    actual: String,
    #[serde(
        rename = "Correct?",
        serialize_with = "write_bool",
        deserialize_with = "read_bool"
    )]
    correct: bool,
}

fn write_bool<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

fn read_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let text = String::deserialize(deserializer)?;
    match text.trim() {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected True or False, found '{other}'"
        ))),
    }
}

/// Write `table` to `path`, replacing any existing file
///
/// The first line is `# <comment>`; line breaks inside `comment` are folded
/// into spaces so the comment stays on one line.
pub fn write_result_table(table: &ResultTable, path: &Path, comment: &str) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# {}", comment.replace(['\r', '\n'], " "))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(HEADER)?;
    for row in table.rows() {
        writer.serialize(CsvRow {
            filename: row.filename.clone(),
            prediction: label_name(row.prediction).to_string(),
            actual: label_name(row.actual).to_string(),
            correct: row.correct,
        })?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Read a file written by [`write_result_table`]
///
/// The first line is skipped when it is a `#` comment; every later line is
/// table data.
pub fn read_result_table(path: &Path) -> Result<ResultTable> {
    if !path.exists() {
        return Err(SVMError::NotFound(path.to_path_buf()));
    }

    // Only the leading line is a comment; rows may start with '#' themselves
    let mut input = BufReader::new(File::open(path)?);
    let mut first_line = String::new();
    input.read_line(&mut first_line)?;
    let leading = if first_line.starts_with('#') {
        String::new()
    } else {
        first_line
    };

    let mut reader = csv::ReaderBuilder::new().from_reader(Cursor::new(leading).chain(input));

    let headers = reader.headers()?.clone();
    if headers.iter().collect::<Vec<_>>() != HEADER {
        return Err(SVMError::ParseError(format!(
            "{}: unexpected header {:?}",
            path.display(),
            headers
        )));
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let record: CsvRow = record?;
        rows.push(ResultRow {
            filename: record.filename,
            prediction: label_from_name(&record.prediction)?,
            actual: label_from_name(&record.actual)?,
            correct: record.correct,
        });
    }

    Ok(ResultTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CAT, DOG};
    use std::fs;
    use tempfile::TempDir;

    fn table() -> ResultTable {
        ResultTable::from_predictions(
            &["cat.1.jpg".to_string(), "dog, with comma.jpg".to_string()],
            &[CAT, CAT],
            &[CAT, DOG],
        )
        .unwrap()
    }

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results_linear.csv");

        write_result_table(&table(), &path, "Linear kernel").unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# Linear kernel");
        assert_eq!(lines[1], "Filename,Prediction,Actual,Correct?");
        assert_eq!(lines[2], "cat.1.jpg,cat,cat,True");
        assert_eq!(lines[3], "\"dog, with comma.jpg\",cat,dog,False");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let original = table();

        write_result_table(&original, &path, "round trip").unwrap();
        let restored = read_result_table(&path).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_hash_prefixed_filename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let original = ResultTable::from_predictions(
            &["#1.jpg".to_string(), "dog.2.jpg".to_string(), "#".to_string()],
            &[DOG, DOG, CAT],
            &[CAT, DOG, CAT],
        )
        .unwrap();

        write_result_table(&original, &path, "hash rows").unwrap();
        let restored = read_result_table(&path).unwrap();

        assert_eq!(restored.len(), 3);
        assert_eq!(restored.rows()[0].filename, "#1.jpg");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_read_without_comment_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.csv");
        fs::write(
            &path,
            "Filename,Prediction,Actual,Correct?\ncat.1.jpg,cat,cat,True\n",
        )
        .unwrap();

        let table = read_result_table(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.n_correct(), 1);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "old contents that are much longer than the new file\n".repeat(20))
            .unwrap();

        write_result_table(&ResultTable::default(), &path, "multi\nline").unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert_eq!(text, "# multi line\nFilename,Prediction,Actual,Correct?\n");
        assert!(read_result_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let result = write_result_table(&table(), &path, "x");
        assert!(matches!(result, Err(SVMError::IoError(_))));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_result_table(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(SVMError::NotFound(_))));
    }

    #[test]
    fn test_read_rejects_foreign_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        assert!(matches!(
            read_result_table(&path),
            Err(SVMError::ParseError(_))
        ));
    }
}
