//! # Hydration Target Estimator
//!
//! Converts body weight, climate and activity into a daily water target, and
//! classifies a day's intake against that target.
//!
//! ## Formula
//!
//! ```text
//! base_ml  = weight_kg * 35
//!          + 500   (Hot)      | - 200 (Cold)     | 0 (Moderate)
//!          + 400   (High)     | + 200 (Medium)   | 0 (Low)
//! target_l = round(base_ml / 1000, 2)
//! ```
//!
//! Both functions are total and pure. Out-of-range inputs such as a negative
//! weight are computed as-is; validation belongs to whoever collects input.

use crate::{ActivityLevel, Climate, HydrationResult, HydrationStatus, Profile};

/// Milliliters of water per kilogram of body weight
const ML_PER_KG: f64 = 35.0;

const HOT_CLIMATE_ML: f64 = 500.0;
const COLD_CLIMATE_ML: f64 = -200.0;
const HIGH_ACTIVITY_ML: f64 = 400.0;
const MEDIUM_ACTIVITY_ML: f64 = 200.0;

/// Round to two decimal places.
///
/// Rounds the exact binary value, so a stored 1.085 (really 1.08499..)
/// becomes 1.08 and true ties go to the even cent.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Daily hydration target in liters.
///
/// # Example
/// ```
/// use hydro_lib::estimator::estimate;
/// use hydro_lib::{ActivityLevel, Climate};
///
/// assert_eq!(estimate(70.0, Climate::Moderate, ActivityLevel::Low), 2.45);
/// assert_eq!(estimate(70.0, Climate::Hot, ActivityLevel::High), 3.35);
/// ```
pub fn estimate(weight_kg: f64, climate: Climate, activity: ActivityLevel) -> f64 {
    let mut base_ml = weight_kg * ML_PER_KG;

    base_ml += match climate {
        Climate::Hot => HOT_CLIMATE_ML,
        Climate::Cold => COLD_CLIMATE_ML,
        Climate::Moderate => 0.0,
    };

    base_ml += match activity {
        ActivityLevel::High => HIGH_ACTIVITY_ML,
        ActivityLevel::Medium => MEDIUM_ACTIVITY_ML,
        ActivityLevel::Low => 0.0,
    };

    round2(base_ml / 1000.0)
}

/// Compare an intake against a target.
///
/// Underhydrated only when the rounded remaining amount is strictly positive;
/// an exact match counts as adequate.
pub fn assess(target_l: f64, intake_l: f64) -> HydrationResult {
    let remaining_l = round2(target_l - intake_l);
    let status = if remaining_l > 0.0 {
        HydrationStatus::Underhydrated
    } else {
        HydrationStatus::Adequate
    };

    HydrationResult {
        target_l,
        remaining_l,
        status,
    }
}

/// Estimate and assess in one step for a full profile.
pub fn evaluate(profile: &Profile) -> HydrationResult {
    let target_l = estimate(profile.weight_kg, profile.climate, profile.activity);
    assess(target_l, profile.intake_l)
}
