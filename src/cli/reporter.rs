// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Spatial Engine Contributors

//! CLI output reporter with colored formatting

use super::commands::{MeasureReport, ProbeReport};
use crate::io::ObjSummary;
use colored::*;
use std::path::Path;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    fn field(name: &str, value: impl std::fmt::Display) {
        println!("  {} {}", format!("{name}:").bright_black(), value);
    }

    fn flag(name: &str, value: bool) {
        let shown = if value { "yes".green() } else { "no".red() };
        Self::field(name, shown);
    }

    pub fn report_probe(path: &Path, report: &ProbeReport) {
        println!();
        Self::rule();
        println!(
            "{} {} {} {}",
            "Probe:".bold(),
            report.point.to_string().cyan(),
            "against".bright_black(),
            path.display().to_string().cyan()
        );
        Self::rule();
        Self::flag("Closed mesh", report.closed);
        Self::flag("Touches", report.touches);
        Self::flag("Intersects", report.intersects);
        Self::flag("Inside AABB", report.in_aabb);
        Self::flag("Inside OBB", report.in_obb);
    }

    pub fn report_measure(path: &Path, report: &MeasureReport) {
        println!();
        Self::rule();
        println!(
            "{} {} ({})",
            "Measure:".bold(),
            path.display().to_string().cyan(),
            report.geometry_type
        );
        Self::rule();
        Self::field("Area", format!("{:.6}", report.area));
        Self::field("Length", format!("{:.6}", report.length));
        if let Some(distance) = report.distance {
            Self::field("Distance", format!("{distance:.6}").yellow());
        }
        if let Some(intersects) = report.intersects {
            Self::flag("Intersects", intersects);
        }
    }

    pub fn report_export(output: &Path, summary: &ObjSummary, duration: Duration) {
        Self::success(&format!(
            "Wrote {} ({} vertices, {} faces) in {}",
            output.display(),
            summary.vertex_count,
            summary.face_count,
            Self::format_duration(duration)
        ));
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(Reporter::format_duration(Duration::from_micros(750)), "750µs");
        assert_eq!(Reporter::format_duration(Duration::from_micros(12_500)), "12.50ms");
        assert_eq!(Reporter::format_duration(Duration::from_secs(3)), "3.00s");
    }
}
