//! # Result Rendering
//!
//! Terminal output for both workflows plus a raster version of the
//! intake-vs-target chart.
//!
//! - Status card and report text for the manual workflow
//! - ASCII two-bar chart (always printed)
//! - `embedded-graphics` two-bar chart drawn into any `BinaryColor` target;
//!   [`Bitmap`] is an in-memory target that serialises to a PBM image
//! - Dataset preview and batch result tables

use crate::batch::RowOutcome;
use crate::dataset::DatasetRow;
use crate::reminder::ReminderText;
use crate::{HydrationResult, HydrationStatus, Profile};
use chrono::{DateTime, Local};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment},
    text::{Alignment, Text},
};
use std::fs;
use std::io;
use std::path::Path;

/// Width of the longest ASCII bar in characters
const ASCII_BAR_WIDTH: usize = 40;

/// Raster chart size written by `--chart`
pub const CHART_WIDTH: u32 = 320;
pub const CHART_HEIGHT: u32 = 200;

const BAR_LABELS: [&str; 2] = ["Your Intake", "Target"];

/// Chart axis maximum: one liter of headroom above the taller bar.
pub fn axis_max(intake_l: f64, target_l: f64) -> f64 {
    intake_l.max(target_l) + 1.0
}

/// One-line status message for a hydration result.
pub fn status_message(result: &HydrationResult) -> String {
    match result.status {
        HydrationStatus::Underhydrated => format!(
            "⚠️ Slightly Underhydrated – You need {} L more water today.",
            result.remaining_l
        ),
        HydrationStatus::Adequate => {
            "✅ Adequately Hydrated – You’ve reached your hydration goal!".to_string()
        }
    }
}

/// Horizontal two-bar chart of intake against target.
pub fn ascii_chart(intake_l: f64, target_l: f64) -> String {
    let max = axis_max(intake_l, target_l);
    let bar = |value: f64| {
        let len = ((value.max(0.0) / max) * ASCII_BAR_WIDTH as f64).round() as usize;
        "█".repeat(len.min(ASCII_BAR_WIDTH))
    };

    let mut out = String::new();
    for (label, value) in BAR_LABELS.iter().zip([intake_l, target_l]) {
        out.push_str(&format!(
            "{:<11} │{:<width$} {:.2} L\n",
            label,
            bar(value),
            value,
            width = ASCII_BAR_WIDTH
        ));
    }
    out.push_str(&format!(
        "{:<11} └{}\n{:<12}0{:>width$}\n",
        "",
        "─".repeat(ASCII_BAR_WIDTH),
        "",
        format!("{max:.2} L"),
        width = ASCII_BAR_WIDTH
    ));
    out
}

/// Full manual-mode report: status card, reminder and chart.
pub fn manual_report(
    profile: &Profile,
    result: &HydrationResult,
    reminder: &ReminderText,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "💧 Hydration report ({})\n\n",
        generated_at.format("%-m/%-d %-I:%M%p")
    ));
    out.push_str(&format!(
        "Daily target: {:.2} L   Intake so far: {:.2} L\n\n",
        result.target_l, profile.intake_l
    ));
    out.push_str("🚦 Hydration Status\n");
    out.push_str(&status_message(result));
    out.push_str("\n\n📋 AI-Generated Reminder Schedule\n");
    out.push_str(&reminder.text());
    out.push_str("\n\n📊 Intake vs Target\n");
    out.push_str(&ascii_chart(profile.intake_l, result.target_l));
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let mut cut: String = single_line.chars().take(max_chars - 1).collect();
        cut.push('…');
        cut
    }
}

/// First `count` dataset rows as a text table.
pub fn dataset_preview(rows: &[DatasetRow], count: usize) -> String {
    let cell = |value: &Option<String>| value.as_deref().unwrap_or("").to_string();
    let mut out = format!(
        "{:>4} {:>5} {:<8} {:>9} {:>15} {}\n",
        "", "age", "gender", "weight_kg", "hydration_level", "activity_type"
    );
    for (index, row) in rows.iter().take(count).enumerate() {
        out.push_str(&format!(
            "{:>4} {:>5} {:<8} {:>9} {:>15} {}\n",
            index,
            cell(&row.age),
            cell(&row.gender),
            cell(&row.weight_kg),
            cell(&row.hydration_level),
            cell(&row.activity_type)
        ));
    }
    out
}

/// Batch outcomes as a text table, reminders shortened to one line.
pub fn results_table(outcomes: &[RowOutcome]) -> String {
    let mut out = format!(
        "{:>4} {:>4} {:<7} {:>7} {:>7} {:>7}  {}\n",
        "#", "Age", "Gender", "Weight", "Intake", "Target", "AI Reminder"
    );
    for (index, outcome) in outcomes.iter().enumerate() {
        let line = match outcome {
            RowOutcome::Processed(record) => format!(
                "{:>4} {:>4} {:<7} {:>7} {:>7} {:>7.2}  {}\n",
                index + 1,
                record.age,
                record.gender,
                record.weight_kg,
                record.intake_l,
                record.target_l,
                truncate(&record.reminder, 60)
            ),
            RowOutcome::Failed { message, .. } => format!("{:>4} {}\n", index + 1, message),
        };
        out.push_str(&line);
    }
    out
}

/// Geometry of the raster chart.
#[derive(Clone, Copy, Debug)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
}

impl ChartLayout {
    const LEFT: i32 = 36;
    const TOP: i32 = 20;
    const BOTTOM: i32 = 20;

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn plot_height(&self) -> i32 {
        self.height as i32 - Self::TOP - Self::BOTTOM
    }

    fn baseline(&self) -> i32 {
        self.height as i32 - Self::BOTTOM
    }

    fn slot_width(&self) -> i32 {
        (self.width as i32 - Self::LEFT) / 2
    }

    /// Pixel y for a value on the axis.
    fn value_to_y(&self, value: f64, max: f64) -> i32 {
        let ratio = (value / max).clamp(0.0, 1.0);
        self.baseline() - (ratio * self.plot_height() as f64).round() as i32
    }

    /// Rectangle covered by bar `index` (0 = intake, 1 = target).
    pub fn bar_rect(&self, index: usize, value: f64, max: f64) -> Rectangle {
        let slot = self.slot_width();
        let bar_width = slot / 2;
        let left = Self::LEFT + slot * index as i32 + (slot - bar_width) / 2;
        let top = self.value_to_y(value, max);
        let height = (self.baseline() - top).max(0) as u32;
        Rectangle::new(Point::new(left, top), Size::new(bar_width as u32, height))
    }
}

/// Draw the intake-vs-target bar chart into `display`.
///
/// The intake bar is solid and the target bar is outlined, each labeled with
/// its value. Integer liter ticks run along the left axis.
pub fn draw_chart<D>(display: &mut D, intake_l: f64, target_l: f64) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor> + OriginDimensions,
{
    let size = display.size();
    let layout = ChartLayout::new(size.width, size.height);
    let max = axis_max(intake_l, target_l);
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let axis = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    // Axes
    let origin = Point::new(ChartLayout::LEFT, layout.baseline());
    Line::new(origin, Point::new(ChartLayout::LEFT, ChartLayout::TOP))
        .into_styled(axis)
        .draw(display)?;
    Line::new(origin, Point::new(size.width as i32 - 1, layout.baseline()))
        .into_styled(axis)
        .draw(display)?;

    // Y ticks every liter
    let mut liters: i32 = 0;
    while f64::from(liters) <= max {
        let y = layout.value_to_y(f64::from(liters), max);
        Line::new(Point::new(ChartLayout::LEFT - 4, y), Point::new(ChartLayout::LEFT, y))
            .into_styled(axis)
            .draw(display)?;
        Text::with_alignment(
            &format!("{liters}"),
            Point::new(ChartLayout::LEFT - 8, y + 3),
            text_style,
            Alignment::Right,
        )
        .draw(display)?;
        liters += 1;
    }

    // Bars with value and category labels
    let styles = [
        PrimitiveStyle::with_fill(BinaryColor::On),
        PrimitiveStyleBuilder::new()
            .stroke_color(BinaryColor::On)
            .stroke_width(2)
            .stroke_alignment(StrokeAlignment::Inside)
            .build(),
    ];
    for (index, value) in [intake_l, target_l].into_iter().enumerate() {
        let rect = layout.bar_rect(index, value, max);
        rect.into_styled(styles[index]).draw(display)?;

        let center_x = rect.top_left.x + rect.size.width as i32 / 2;
        Text::with_alignment(
            &format!("{value:.2} L"),
            Point::new(center_x, rect.top_left.y - 3),
            text_style,
            Alignment::Center,
        )
        .draw(display)?;
        Text::with_alignment(
            BAR_LABELS[index],
            Point::new(center_x, layout.baseline() + 12),
            text_style,
            Alignment::Center,
        )
        .draw(display)?;
    }

    Ok(())
}

/// Monochrome in-memory frame buffer, one bit per pixel, rows padded to bytes.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        let row_bytes = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            data: vec![0; row_bytes * height as usize],
        }
    }

    fn row_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    /// True when the pixel is set (black). Out-of-bounds reads are false.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y as usize * self.row_bytes() + (x / 8) as usize];
        byte & (0x80 >> (x % 8)) != 0
    }

    fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        let index = y as usize * self.row_bytes() + (x / 8) as usize;
        let mask = 0x80 >> (x % 8);
        if on {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Number of set pixels.
    pub fn count_on(&self) -> u32 {
        self.data.iter().map(|b| b.count_ones()).sum()
    }

    /// Binary PBM (P4) encoding; set bits are black.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.data);
        out
    }

    pub fn save_pbm<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_pbm())
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < self.width && y < self.height {
                    self.set_pixel(x, y, color.is_on());
                }
            }
        }
        Ok(())
    }
}

/// Render the chart at the default size.
pub fn render_chart(intake_l: f64, target_l: f64) -> Bitmap {
    let mut bitmap = Bitmap::new(CHART_WIDTH, CHART_HEIGHT);
    // Drawing into a Bitmap cannot fail
    draw_chart(&mut bitmap, intake_l, target_l).unwrap_or_else(|never| match never {});
    bitmap
}
