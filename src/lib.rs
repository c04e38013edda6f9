//! # Hydro Tracker Core Library
//!
//! This library provides the foundational value types and the processing
//! pipeline for the hydro tracker application: a daily water-intake target
//! estimator paired with a natural-language reminder obtained from a
//! text-completion service.
//!
//! ## Design Philosophy
//!
//! ### Pure Core
//! - **Stateless estimator**: the hydration target is a constant-time function of
//!   weight, climate and activity. Nothing is cached and nothing is persisted.
//! - **Plain value records**: [`Profile`] and [`HydrationResult`] are `Copy`
//!   structures that live for a single request or dataset row.
//!
//! ### Degrade, Never Abort
//! Every failure in the system ends up as displayed text:
//! - A failing completions call becomes either the fixed mock reminder (quota
//!   exhausted) or an inline warning string, see [`reminder::ReminderText`]
//! - A malformed dataset row becomes an error record in the batch output
//! - A missing dataset file is reported to the user and the workflow stops
//!
//! ### Data Flow
//! 1. **Manual**: form/flags → [`Profile`] → estimate → reminder → status card + chart
//! 2. **Batch**: CSV rows → per-row outcome (result or error text) → CSV export
//! 3. **Clean**: full wellness CSV → five required columns, first N rows
//!
//! ## Core Types
//!
//! - [`Profile`]: the person being assessed
//! - [`HydrationResult`]: target, remaining amount and [`HydrationStatus`]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Module declarations
pub mod batch;
pub mod config;
pub mod dataset;
pub mod estimator;
pub mod form;
pub mod reminder;
pub mod renderer;

/// A label that does not name any variant of one of the enumerated inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    /// Which input was being parsed ("gender", "activity level", "climate")
    pub kind: &'static str,
    /// The rejected text
    pub value: String,
}

/// Case-insensitive lookup of `value` in a label table.
fn parse_label<T: Copy>(
    kind: &'static str,
    value: &str,
    table: &[(&str, T)],
) -> Result<T, ParseLabelError> {
    let wanted = value.trim();
    table
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(wanted))
        .map(|(_, variant)| *variant)
        .ok_or_else(|| ParseLabelError {
            kind,
            value: value.to_string(),
        })
}

/// Gender as collected by the input form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(
            "gender",
            s,
            &[("Male", Gender::Male), ("Female", Gender::Female)],
        )
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Daily physical activity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [
        ActivityLevel::Low,
        ActivityLevel::Medium,
        ActivityLevel::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Low => "Low",
            ActivityLevel::Medium => "Medium",
            ActivityLevel::High => "High",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(
            "activity level",
            s,
            &[
                ("Low", ActivityLevel::Low),
                ("Medium", ActivityLevel::Medium),
                ("High", ActivityLevel::High),
            ],
        )
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Climate the person lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Climate {
    Moderate,
    Hot,
    Cold,
}

impl Climate {
    pub const ALL: [Climate; 3] = [Climate::Moderate, Climate::Hot, Climate::Cold];

    pub fn label(self) -> &'static str {
        match self {
            Climate::Moderate => "Moderate",
            Climate::Hot => "Hot",
            Climate::Cold => "Cold",
        }
    }
}

impl FromStr for Climate {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(
            "climate",
            s,
            &[
                ("Moderate", Climate::Moderate),
                ("Hot", Climate::Hot),
                ("Cold", Climate::Cold),
            ],
        )
    }
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The person being assessed.
///
/// Range limits (age 10–90, weight 30–150 kg, intake ≥ 0 L) are enforced
/// where input is collected, not here: the estimator is total over any
/// numeric input.
///
/// # Example
/// ```
/// use hydro_lib::{ActivityLevel, Climate, Gender, Profile};
///
/// let profile = Profile {
///     age: 25,
///     gender: Gender::Female,
///     weight_kg: 65.0,
///     activity: ActivityLevel::Medium,
///     climate: Climate::Hot,
///     intake_l: 1.5,
/// };
///
/// assert_eq!(profile.gender.label(), "Female");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Body weight in kilograms
    pub weight_kg: f64,
    pub activity: ActivityLevel,
    pub climate: Climate,
    /// Water already drunk today, in liters
    pub intake_l: f64,
}

/// Whether today's intake reaches the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HydrationStatus {
    Underhydrated,
    Adequate,
}

/// Outcome of comparing an intake against the computed target.
///
/// `remaining_l` is `target_l - intake_l` rounded to two decimals and is
/// negative when the person drank more than the target.
///
/// # Example
/// ```
/// use hydro_lib::estimator::assess;
/// use hydro_lib::HydrationStatus;
///
/// let result = assess(2.45, 1.5);
/// assert_eq!(result.remaining_l, 0.95);
/// assert_eq!(result.status, HydrationStatus::Underhydrated);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HydrationResult {
    /// Daily target in liters
    pub target_l: f64,
    /// Liters still to drink today (may be negative)
    pub remaining_l: f64,
    pub status: HydrationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_case_insensitively() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" FEMALE ".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("high".parse::<ActivityLevel>().unwrap(), ActivityLevel::High);
        assert_eq!("Cold".parse::<Climate>().unwrap(), Climate::Cold);
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = "Other".parse::<Gender>().unwrap_err();
        assert_eq!(err.kind, "gender");
        assert_eq!(err.to_string(), "unknown gender 'Other'");
        assert!("Extreme".parse::<ActivityLevel>().is_err());
        assert!("Tropical".parse::<Climate>().is_err());
    }

    #[test]
    fn test_display_matches_label() {
        for climate in Climate::ALL {
            assert_eq!(climate.to_string(), climate.label());
            assert_eq!(climate.label().parse::<Climate>().unwrap(), climate);
        }
        for activity in ActivityLevel::ALL {
            assert_eq!(activity.to_string(), activity.label());
        }
        for gender in Gender::ALL {
            assert_eq!(gender.to_string(), gender.label());
        }
    }
}
