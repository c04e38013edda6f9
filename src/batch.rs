//! # Batch Reminder Generation
//!
//! Applies the estimator and the reminder request to every dataset row, one
//! row at a time, and exports the collected results as CSV.
//!
//! ## Row Isolation
//!
//! Each row yields a [`RowOutcome`]: either a [`ReminderRecord`] or an error
//! message naming the 1-based row number. A bad row never stops the batch;
//! the outcome list always has exactly one entry per input row, in order.
//!
//! ## Row Defaults
//!
//! - `weight_kg` / `hydration_level` missing → `0`
//! - `activity_type` missing → Medium; unrecognised → no activity adjustment
//! - climate is always Moderate
//!
//! ## Export Format
//!
//! Columns `Age, Gender, Weight (kg), Water Intake (L), Target (L), AI Reminder`.
//! If any row failed an `Error` column is appended; failed rows fill only
//! that column.

use crate::dataset::DatasetRow;
use crate::estimator::estimate;
use crate::reminder::{build_prompt, request_reminder, TextGenerator};
use crate::{ActivityLevel, Climate, Gender, ParseLabelError, Profile};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result columns, in export order
pub const EXPORT_COLUMNS: [&str; 6] = [
    "Age",
    "Gender",
    "Weight (kg)",
    "Water Intake (L)",
    "Target (L)",
    "AI Reminder",
];

/// Extra column present only when at least one row failed
pub const ERROR_COLUMN: &str = "Error";

/// Why a dataset row could not be turned into a profile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("missing value for '{0}'")]
    MissingField(&'static str),

    #[error("invalid number '{value}' for '{field}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error(transparent)]
    UnknownLabel(#[from] ParseLabelError),
}

/// Errors writing or re-reading an export file.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export IO: {0}")]
    Io(#[from] io::Error),

    #[error("export CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One successfully processed row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Weight (kg)")]
    pub weight_kg: f64,
    #[serde(rename = "Water Intake (L)")]
    pub intake_l: f64,
    #[serde(rename = "Target (L)")]
    pub target_l: f64,
    #[serde(rename = "AI Reminder")]
    pub reminder: String,
    /// Reminder is the mock or an error notice rather than generated text
    #[serde(skip)]
    pub fallback: bool,
}

/// Per-row result of a batch run.
#[derive(Clone, Debug, PartialEq)]
pub enum RowOutcome {
    Processed(ReminderRecord),
    Failed {
        /// 1-based row number within the dataset
        row: usize,
        /// Displayed error text
        message: String,
    },
}

impl RowOutcome {
    pub fn record(&self) -> Option<&ReminderRecord> {
        match self {
            RowOutcome::Processed(record) => Some(record),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}

/// Fraction-complete counter reported once per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Counts of processed and failed rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    /// Processed rows whose reminder did not come from the generator
    pub fallbacks: usize,
}

pub fn summarize(outcomes: &[RowOutcome]) -> BatchSummary {
    outcomes
        .iter()
        .fold(BatchSummary::default(), |mut summary, outcome| {
            match outcome {
                RowOutcome::Failed { .. } => summary.failed += 1,
                RowOutcome::Processed(record) => {
                    summary.processed += 1;
                    if record.fallback {
                        summary.fallbacks += 1;
                    }
                }
            }
            summary
        })
}

fn parse_number(field: &'static str, value: Option<&str>) -> Result<f64, RowError> {
    match value {
        None => Ok(0.0),
        Some(text) => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| RowError::InvalidNumber {
                field,
                value: text.to_string(),
            }),
    }
}

fn parse_age(value: Option<&str>) -> Result<u32, RowError> {
    let text = value.ok_or(RowError::MissingField("age"))?;
    if let Ok(age) = text.parse::<u32>() {
        return Ok(age);
    }
    // Spreadsheet exports sometimes write whole numbers as "34.0"
    text.parse::<f64>()
        .ok()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
        .ok_or_else(|| RowError::InvalidNumber {
            field: "age",
            value: text.to_string(),
        })
}

fn parse_activity(value: Option<&str>) -> ActivityLevel {
    match value {
        None => ActivityLevel::Medium,
        Some(label) => label.parse().unwrap_or_else(|_| {
            debug!("Unrecognised activity '{label}', applying no activity adjustment");
            ActivityLevel::Low
        }),
    }
}

/// Build a profile from a raw dataset row.
pub fn profile_from_row(row: &DatasetRow) -> Result<Profile, RowError> {
    let age = parse_age(row.age.as_deref())?;
    let gender = row
        .gender
        .as_deref()
        .ok_or(RowError::MissingField("gender"))?
        .parse::<Gender>()?;

    Ok(Profile {
        age,
        gender,
        weight_kg: parse_number("weight_kg", row.weight_kg.as_deref())?,
        activity: parse_activity(row.activity_type.as_deref()),
        climate: Climate::Moderate,
        intake_l: parse_number("hydration_level", row.hydration_level.as_deref())?,
    })
}

/// Estimate and request a reminder for a single row.
pub async fn process_row<G: TextGenerator>(
    row: &DatasetRow,
    generator: &G,
) -> Result<ReminderRecord, RowError> {
    let profile = profile_from_row(row)?;
    let target_l = estimate(profile.weight_kg, profile.climate, profile.activity);
    let reminder = request_reminder(generator, &build_prompt(&profile)).await;

    Ok(ReminderRecord {
        age: profile.age,
        gender: profile.gender,
        weight_kg: profile.weight_kg,
        intake_l: profile.intake_l,
        target_l,
        reminder: reminder.text(),
        fallback: reminder.is_fallback(),
    })
}

/// Process every row in order, reporting progress after each one.
pub async fn run_batch<G, F>(rows: &[DatasetRow], generator: &G, mut on_progress: F) -> Vec<RowOutcome>
where
    G: TextGenerator,
    F: FnMut(BatchProgress),
{
    let total = rows.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, row) in rows.iter().enumerate() {
        let number = index + 1;
        let outcome = match process_row(row, generator).await {
            Ok(record) => RowOutcome::Processed(record),
            Err(error) => {
                warn!("Row {number} skipped: {error}");
                RowOutcome::Failed {
                    row: number,
                    message: format!("❌ Error processing row {number}: {error}"),
                }
            }
        };
        outcomes.push(outcome);
        on_progress(BatchProgress {
            completed: number,
            total,
        });
    }

    let summary = summarize(&outcomes);
    info!(
        "Batch complete: {} processed ({} fallback reminders), {} failed",
        summary.processed, summary.fallbacks, summary.failed
    );
    outcomes
}

/// Column names an export of `outcomes` will carry.
pub fn export_columns(outcomes: &[RowOutcome]) -> Vec<&'static str> {
    let mut columns = EXPORT_COLUMNS.to_vec();
    if outcomes.iter().any(RowOutcome::is_failed) {
        columns.push(ERROR_COLUMN);
    }
    columns
}

/// Write outcomes as UTF-8 CSV.
pub fn write_export<W: Write>(outcomes: &[RowOutcome], output: W) -> Result<(), ExportError> {
    let columns = export_columns(outcomes);
    let with_error = columns.len() > EXPORT_COLUMNS.len();

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&columns)?;

    for outcome in outcomes {
        let mut fields = match outcome {
            RowOutcome::Processed(record) => vec![
                record.age.to_string(),
                record.gender.to_string(),
                record.weight_kg.to_string(),
                record.intake_l.to_string(),
                record.target_l.to_string(),
                record.reminder.clone(),
            ],
            RowOutcome::Failed { .. } => vec![String::new(); EXPORT_COLUMNS.len()],
        };
        if with_error {
            fields.push(match outcome {
                RowOutcome::Failed { message, .. } => message.clone(),
                RowOutcome::Processed(_) => String::new(),
            });
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write outcomes to a CSV file at `path`.
pub fn export_csv<P: AsRef<Path>>(outcomes: &[RowOutcome], path: P) -> Result<(), ExportError> {
    let file = File::create(path.as_ref())?;
    write_export(outcomes, file)?;
    info!(
        "Exported {} rows to {}",
        outcomes.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// One row of a re-read export file. Cells are empty on failed rows.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportRow {
    #[serde(rename = "Age")]
    pub age: Option<u32>,
    #[serde(rename = "Gender")]
    pub gender: Option<Gender>,
    #[serde(rename = "Weight (kg)")]
    pub weight_kg: Option<f64>,
    #[serde(rename = "Water Intake (L)")]
    pub intake_l: Option<f64>,
    #[serde(rename = "Target (L)")]
    pub target_l: Option<f64>,
    #[serde(rename = "AI Reminder")]
    pub reminder: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// A parsed export file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<ExportRow>,
}

/// Parse an export produced by [`write_export`].
pub fn read_export<R: Read>(input: R) -> Result<ExportTable, ExportError> {
    let mut reader = csv::Reader::from_reader(input);
    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(ExportTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(age: &str, gender: &str, weight: &str, intake: &str, activity: &str) -> DatasetRow {
        let cell = |s: &str| (!s.is_empty()).then(|| s.to_string());
        DatasetRow {
            age: cell(age),
            gender: cell(gender),
            weight_kg: cell(weight),
            hydration_level: cell(intake),
            activity_type: cell(activity),
        }
    }

    #[test]
    fn test_profile_from_complete_row() {
        let profile = profile_from_row(&row("34", "male", "82.5", "2.1", "High")).unwrap();
        assert_eq!(profile.age, 34);
        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.weight_kg, 82.5);
        assert_eq!(profile.intake_l, 2.1);
        assert_eq!(profile.activity, ActivityLevel::High);
        assert_eq!(profile.climate, Climate::Moderate);
    }

    #[test]
    fn test_profile_defaults() {
        let profile = profile_from_row(&row("34.0", "Female", "", "", "")).unwrap();
        assert_eq!(profile.age, 34);
        assert_eq!(profile.weight_kg, 0.0);
        assert_eq!(profile.intake_l, 0.0);
        assert_eq!(profile.activity, ActivityLevel::Medium);
    }

    #[test]
    fn test_unrecognised_activity_gets_no_adjustment() {
        let profile = profile_from_row(&row("30", "Male", "70", "1", "Cycling")).unwrap();
        assert_eq!(profile.activity, ActivityLevel::Low);
    }

    #[test]
    fn test_row_errors() {
        assert_eq!(
            profile_from_row(&row("", "Male", "70", "1", "Low")),
            Err(RowError::MissingField("age"))
        );
        assert_eq!(
            profile_from_row(&row("30", "", "70", "1", "Low")),
            Err(RowError::MissingField("gender"))
        );
        assert_eq!(
            profile_from_row(&row("30", "Male", "heavy", "1", "Low")),
            Err(RowError::InvalidNumber {
                field: "weight_kg",
                value: "heavy".to_string()
            })
        );
        assert!(matches!(
            profile_from_row(&row("-3", "Male", "70", "1", "Low")),
            Err(RowError::InvalidNumber { field: "age", .. })
        ));
        let err = profile_from_row(&row("30", "Other", "70", "1", "Low")).unwrap_err();
        assert_eq!(err.to_string(), "unknown gender 'Other'");
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(BatchProgress { completed: 1, total: 4 }.fraction(), 0.25);
        assert_eq!(BatchProgress { completed: 0, total: 0 }.fraction(), 1.0);
    }

    fn record(age: u32) -> ReminderRecord {
        ReminderRecord {
            age,
            gender: Gender::Female,
            weight_kg: 61.0,
            intake_l: 1.4,
            target_l: 2.14,
            reminder: "Drink, then drink \"again\".".to_string(),
            fallback: false,
        }
    }

    #[test]
    fn test_export_without_failures_has_six_columns() {
        let outcomes = vec![RowOutcome::Processed(record(27))];
        let mut out = Vec::new();
        write_export(&outcomes, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("Age,Gender,Weight (kg),Water Intake (L),Target (L),AI Reminder")
        );
        assert!(text.contains("27,Female,61,1.4,2.14,\"Drink, then drink \"\"again\"\".\""));
    }

    #[test]
    fn test_export_with_failures_appends_error_column() {
        let outcomes = vec![
            RowOutcome::Processed(record(27)),
            RowOutcome::Failed {
                row: 2,
                message: "❌ Error processing row 2: missing value for 'age'".to_string(),
            },
        ];
        assert_eq!(export_columns(&outcomes).last(), Some(&ERROR_COLUMN));

        let mut out = Vec::new();
        write_export(&outcomes, &mut out).unwrap();
        let table = read_export(out.as_slice()).unwrap();

        assert_eq!(table.columns.len(), 7);
        assert_eq!(table.rows[0].age, Some(27));
        assert_eq!(table.rows[0].error, None);
        assert_eq!(table.rows[1].age, None);
        assert_eq!(
            table.rows[1].error.as_deref(),
            Some("❌ Error processing row 2: missing value for 'age'")
        );
    }

    #[test]
    fn test_summarize_counts() {
        let mut mocked = record(3);
        mocked.fallback = true;
        let outcomes = vec![
            RowOutcome::Processed(record(1)),
            RowOutcome::Failed {
                row: 2,
                message: String::new(),
            },
            RowOutcome::Processed(mocked),
        ];
        assert_eq!(
            summarize(&outcomes),
            BatchSummary {
                processed: 2,
                failed: 1,
                fallbacks: 1,
            }
        );
    }
}
