//! # Profile Input Form
//!
//! The input-collection boundary. This is the only place range limits are
//! enforced: age 10–90 years, weight 30–150 kg, intake 0–5 L. Command-line
//! flags use the same validators as the interactive prompts.

use crate::{ActivityLevel, Climate, Gender, ParseLabelError, Profile};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const AGE_RANGE: RangeInclusive<u32> = 10..=90;
pub const WEIGHT_RANGE: RangeInclusive<f64> = 30.0..=150.0;
pub const INTAKE_RANGE: RangeInclusive<f64> = 0.0..=5.0;

/// Default form values: 25 years, Male, 65 kg, 1.5 L, Low, Moderate.
pub fn default_profile() -> Profile {
    Profile {
        age: 25,
        gender: Gender::Male,
        weight_kg: 65.0,
        activity: ActivityLevel::Low,
        climate: Climate::Moderate,
        intake_l: 1.5,
    }
}

fn parse_in_range<T>(text: &str, range: &RangeInclusive<T>, unit: &str) -> Result<T, String>
where
    T: FromStr + PartialOrd + Display,
{
    let value = text
        .trim()
        .parse::<T>()
        .map_err(|_| format!("'{}' is not a number", text.trim()))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "must be between {}{unit} and {}{unit}",
            range.start(),
            range.end()
        ))
    }
}

/// Validate an age in years.
pub fn parse_age(text: &str) -> Result<u32, String> {
    parse_in_range(text, &AGE_RANGE, "")
}

/// Validate a body weight in kilograms.
pub fn parse_weight(text: &str) -> Result<f64, String> {
    parse_in_range(text, &WEIGHT_RANGE, " kg")
}

/// Validate today's intake in liters.
pub fn parse_intake(text: &str) -> Result<f64, String> {
    parse_in_range(text, &INTAKE_RANGE, " L")
}

fn parse_choice<T: FromStr<Err = ParseLabelError>>(text: &str) -> Result<T, String> {
    text.parse().map_err(|e: ParseLabelError| e.to_string())
}

/// Line-oriented prompt session over any reader/writer pair.
pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask for one field until the answer validates.
    ///
    /// An empty answer keeps `default`; end of input also keeps `default`.
    fn ask<T, F>(&mut self, label: &str, default: T, parse: F) -> io::Result<T>
    where
        T: Display,
        F: Fn(&str) -> Result<T, String>,
    {
        loop {
            write!(self.output, "{label} [{default}]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(default);
            }
            let answer = line.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match parse(answer) {
                Ok(value) => return Ok(value),
                Err(reason) => writeln!(self.output, "  ✗ {label}: {reason}")?,
            }
        }
    }

    /// Collect every profile field, offering `defaults` as the answers.
    pub fn collect(&mut self, defaults: Profile) -> io::Result<Profile> {
        let age = self.ask("Age (years)", defaults.age, parse_age)?;
        let gender = self.ask("Gender (Male/Female)", defaults.gender, parse_choice)?;
        let weight_kg = self.ask("Weight (kg)", defaults.weight_kg, parse_weight)?;
        let intake_l = self.ask("Water Intake Today (L)", defaults.intake_l, parse_intake)?;
        let activity = self.ask(
            "Activity Level (Low/Medium/High)",
            defaults.activity,
            parse_choice,
        )?;
        let climate = self.ask(
            "Climate (Moderate/Hot/Cold)",
            defaults.climate,
            parse_choice,
        )?;

        Ok(Profile {
            age,
            gender,
            weight_kg,
            activity,
            climate,
            intake_l,
        })
    }
}
