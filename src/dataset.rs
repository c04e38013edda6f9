//! # Wellness Dataset Loading and Cleaning
//!
//! The batch workflow reads a CSV file with (at least) the columns
//! `age, gender, weight_kg, hydration_level, activity_type`. Rows are kept as
//! raw text here; turning a row into a [`Profile`](crate::Profile) happens
//! per row in [`batch`](crate::batch) so a bad value only affects its own row.
//!
//! The `clean` operation prepares that file from a full wellness export by
//! keeping only the five required columns and the first N rows.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Columns the batch workflow reads, in output order for `clean`
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "age",
    "gender",
    "weight_kg",
    "hydration_level",
    "activity_type",
];

/// Errors that can occur while reading or cleaning a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset file does not exist; shown to the user, never fatal
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("dataset IO: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input lacks columns that `clean` must keep
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// One dataset row, exactly as found in the file.
///
/// Absent columns and empty cells are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetRow {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub weight_kg: Option<String>,
    /// Water drunk today in liters
    pub hydration_level: Option<String>,
    pub activity_type: Option<String>,
}

/// Summary of a `clean` run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanSummary {
    pub columns: Vec<String>,
    pub rows: usize,
}

fn open(path: &Path) -> Result<File, DatasetError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DatasetError::NotFound(path.to_path_buf()),
        _ => DatasetError::Io(e),
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Load every row of the dataset at `path`.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetRow>, DatasetError> {
    let path = path.as_ref();
    let rows = read_rows(open(path)?)?;
    info!("Dataset loaded: {} ({} rows)", path.display(), rows.len());
    Ok(rows)
}

/// Parse dataset rows from any CSV source with a header line.
pub fn read_rows<R: Read>(input: R) -> Result<Vec<DatasetRow>, DatasetError> {
    let mut rows = Vec::new();
    for record in reader(input).deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Keep the required columns and the first `limit` rows of `input`,
/// writing the result to `output`.
pub fn clean_dataset<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    limit: usize,
) -> Result<CleanSummary, DatasetError> {
    let source = open(input.as_ref())?;
    let target = File::create(output.as_ref())?;
    let summary = clean_records(source, target, limit)?;
    info!(
        "Clean dataset saved as {} ({} rows)",
        output.as_ref().display(),
        summary.rows
    );
    Ok(summary)
}

/// Stream form of [`clean_dataset`].
pub fn clean_records<R: Read, W: Write>(
    input: R,
    output: W,
    limit: usize,
) -> Result<CleanSummary, DatasetError> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();

    let mut indices = Vec::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing = Vec::new();
    for column in REQUIRED_COLUMNS {
        match headers.iter().position(|h| h == column) {
            Some(index) => indices.push(index),
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(missing));
    }

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(REQUIRED_COLUMNS)?;

    let mut rows = 0;
    for record in reader.records().take(limit) {
        let record = record?;
        writer.write_record(indices.iter().map(|&i| record.get(i).unwrap_or("")))?;
        rows += 1;
    }
    writer.flush()?;

    Ok(CleanSummary {
        columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WELLNESS: &str = "\
participant_id,age,gender,height_cm,weight_kg,hydration_level,activity_type,sleep_hours
1,34,Male,180,82.5,2.1,High,7
2,27,Female,165,61,1.4,Low,8
3,45,Female,170,,1.9,Medium,6
";

    #[test]
    fn test_read_rows_keeps_raw_text() {
        let rows = read_rows(WELLNESS.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].age.as_deref(), Some("34"));
        assert_eq!(rows[0].weight_kg.as_deref(), Some("82.5"));
        assert_eq!(rows[1].activity_type.as_deref(), Some("Low"));
        // Empty cell
        assert_eq!(rows[2].weight_kg, None);
    }

    #[test]
    fn test_absent_columns_are_none() {
        let rows = read_rows("age,gender\n30,Male\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gender.as_deref(), Some("Male"));
        assert_eq!(rows[0].activity_type, None);
        assert_eq!(rows[0].hydration_level, None);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        match load_dataset(&path) {
            Err(DatasetError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_keeps_required_columns_and_limit() {
        let mut out = Vec::new();
        let summary = clean_records(WELLNESS.as_bytes(), &mut out, 2).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, REQUIRED_COLUMNS.to_vec());

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "age,gender,weight_kg,hydration_level,activity_type",
                "34,Male,82.5,2.1,High",
                "27,Female,61,1.4,Low",
            ]
        );
    }

    #[test]
    fn test_clean_reports_missing_columns() {
        let err = clean_records("age,gender\n1,Male\n".as_bytes(), Vec::new(), 50).unwrap_err();
        match err {
            DatasetError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["weight_kg", "hydration_level", "activity_type"])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_clean_file_roundtrip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("wellness_dataset.csv");
        let output = dir.path().join("clean.csv");
        fs::write(&input, WELLNESS).unwrap();

        let summary = clean_dataset(&input, &output, 50).unwrap();
        assert_eq!(summary.rows, 3);

        let rows = load_dataset(&output).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].gender.as_deref(), Some("Female"));
        assert_eq!(rows[2].weight_kg, None);
    }
}
