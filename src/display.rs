//! Output Formatting and Display Management
//!
//! Renders aggregation results either as colored terminal reports or as JSON
//! for programmatic consumption.
//!
//! ## Report Types
//!
//! - **Overview**: cost ranking of actors or resources for one category and
//!   month, with usage and free-quota consumption
//! - **Trend**: month-by-month cost and usage of one actor or resource
//! - **Summary**: cost per category for one month
//! - **Categories**: the configured billing categories
//!
//! Empty reports render an explicit "no data" message rather than an error.
//! Free-quota consumption above 100% is highlighted as overage.

use crate::models::{AggregatedEntry, CategorySummary, DataSummary, Dimension, MonthlyTrendPoint};
use crate::registry::CategoryConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewReport {
    pub category: String,
    pub label: String,
    pub period_key: String,
    pub dimension: Dimension,
    pub summary: DataSummary,
    /// Number of groups before the display limit was applied
    pub total_groups: usize,
    pub dropped_records: usize,
    /// False when the export for the period could not be fetched
    pub source_available: bool,
    pub entries: Vec<AggregatedEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub category: String,
    pub label: String,
    pub target: String,
    pub dimension: Dimension,
    pub points: Vec<MonthlyTrendPoint>,
    pub dropped_records: usize,
    pub failed_periods: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummaryReport {
    pub period_key: String,
    pub categories: Vec<CategorySummary>,
    pub dropped_records: usize,
    pub failed_categories: Vec<String>,
}

pub struct ReportDisplayManager {
    json_pretty: bool,
}

impl Default for ReportDisplayManager {
    fn default() -> Self {
        Self::new(true)
    }
}

fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

fn format_quota(percent: f64) -> String {
    let text = format!("{:.1}% of free quota", percent);
    if percent > 100.0 {
        format!("{} {}", text.bright_red().bold(), "(overage)".bright_red())
    } else if percent > 80.0 {
        text.bright_yellow().to_string()
    } else {
        text.bright_green().to_string()
    }
}

fn dropped_line(out: &mut String, dropped: usize) {
    if dropped > 0 {
        let _ = writeln!(
            out,
            "   {} invalid records excluded",
            dropped.to_string().bright_red()
        );
    }
}

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", "=".repeat(80).bright_cyan());
    let _ = writeln!(out, "{}", title.bright_white().bold());
    let _ = writeln!(out, "{}", "=".repeat(80).bright_cyan());
}

impl ReportDisplayManager {
    pub fn new(json_pretty: bool) -> Self {
        Self { json_pretty }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.context("Failed to serialize report to JSON")
    }

    pub fn render_overview(&self, report: &OverviewReport) -> String {
        let mut out = String::new();
        banner(
            &mut out,
            &format!("{} Usage Report - {} by {}", report.label, report.period_key, report.dimension),
        );

        if !report.source_available {
            let _ = writeln!(
                out,
                "\n   {} export for {} unavailable",
                report.label.bright_red(),
                report.period_key
            );
        }

        if report.entries.is_empty() {
            let _ = writeln!(
                out,
                "\nNo usage data for {} in {}.",
                report.label, report.period_key
            );
            dropped_line(&mut out, report.dropped_records);
            return out;
        }

        let _ = writeln!(
            out,
            "\n{} {} records • {} {}s • {} total",
            "📊".bright_yellow(),
            report.summary.item_count.to_string().bright_white().bold(),
            report.total_groups.to_string().bright_white().bold(),
            report.dimension,
            format_cost(report.summary.total_cost).bright_green().bold()
        );
        if let Some(percent) = report.summary.free_quota_usage_percent {
            let _ = writeln!(out, "   Free quota: {}", format_quota(percent));
        }
        dropped_line(&mut out, report.dropped_records);
        let _ = writeln!(out);

        for (rank, entry) in report.entries.iter().enumerate() {
            let _ = write!(
                out,
                "{:>4}. {}: {} ({}%)",
                rank + 1,
                entry.group_name.bright_cyan(),
                format_cost(entry.total_cost).bright_green(),
                format!("{:.1}", entry.percentage_of_total).bright_yellow()
            );
            if let (Some(usage), Some(unit)) = (entry.total_usage, entry.usage_unit.as_deref()) {
                let _ = write!(out, " • {:.0} {}", usage, unit);
            }
            if let Some(percent) = entry.free_quota_usage_percent {
                let _ = write!(out, " • {}", format_quota(percent));
            }
            let _ = writeln!(out);
        }

        if report.entries.len() < report.total_groups {
            let _ = writeln!(
                out,
                "\n   … {} more not shown",
                report.total_groups - report.entries.len()
            );
        }

        out
    }

    pub fn render_trend(&self, report: &TrendReport) -> String {
        let mut out = String::new();
        banner(
            &mut out,
            &format!("{} Monthly Trend - {} {}", report.label, report.dimension, report.target),
        );

        if report.points.iter().all(|point| point.record_count == 0) {
            let _ = writeln!(out, "\nNo usage data for {} in this period.", report.target);
        } else {
            let total = report.points.iter().fold(0.0, |acc, point| acc + point.cost);
            let _ = writeln!(
                out,
                "\n{} {} total across {} months\n",
                "📊".bright_yellow(),
                format_cost(total).bright_green().bold(),
                report.points.len().to_string().bright_white().bold()
            );

            for point in &report.points {
                let _ = write!(
                    out,
                    "   {}: {} ({} records)",
                    point.period_key.bright_white().bold(),
                    format_cost(point.cost).bright_green(),
                    point.record_count
                );
                if let Some(usage) = point.usage {
                    let unit = point.usage_unit.as_deref().unwrap_or("");
                    let _ = write!(out, " • {:.0} {}", usage, unit);
                }
                if let Some(percent) = point.free_quota_usage_percent {
                    let _ = write!(out, " • {}", format_quota(percent));
                }
                let _ = writeln!(out);
            }
        }

        dropped_line(&mut out, report.dropped_records);
        if !report.failed_periods.is_empty() {
            let _ = writeln!(
                out,
                "\n   {} unavailable: {}",
                "Periods".bright_red(),
                report.failed_periods.join(", ")
            );
        }

        out
    }

    pub fn render_category_summary(&self, report: &CategorySummaryReport) -> String {
        let mut out = String::new();
        banner(&mut out, &format!("Category Summary - {}", report.period_key));

        if report.categories.iter().all(|category| category.item_count == 0) {
            let _ = writeln!(out, "\nNo usage data for {}.", report.period_key);
        } else {
            let total = report.categories.iter().fold(0.0, |acc, c| acc + c.total_cost);
            let _ = writeln!(
                out,
                "\n{} {} total\n",
                "📊".bright_yellow(),
                format_cost(total).bright_green().bold()
            );
            for category in &report.categories {
                let _ = writeln!(
                    out,
                    "   {}: {} ({} records)",
                    category.category.bright_cyan(),
                    format_cost(category.total_cost).bright_green(),
                    category.item_count
                );
            }
        }

        dropped_line(&mut out, report.dropped_records);
        if !report.failed_categories.is_empty() {
            let _ = writeln!(
                out,
                "\n   {} unavailable: {}",
                "Categories".bright_red(),
                report.failed_categories.join(", ")
            );
        }

        out
    }

    pub fn render_categories(&self, categories: &[CategoryConfig]) -> String {
        let mut out = String::new();
        banner(&mut out, "Billing Categories");
        let _ = writeln!(out);

        for config in categories {
            let _ = write!(
                out,
                "   {} ({}): measured in {} [{}]",
                config.id.bright_cyan(),
                config.label,
                config.measurement,
                config.unit
            );
            if let Some(quota) = &config.free_quota {
                let _ = write!(out, " • free quota {} {}", quota.limit, quota.unit);
            }
            let _ = writeln!(out);
        }

        out
    }

    pub fn display_overview(&self, report: &OverviewReport, json_output: bool) -> Result<()> {
        let text = if json_output {
            self.to_json(report)?
        } else {
            self.render_overview(report)
        };
        println!("{}", text);
        Ok(())
    }

    pub fn display_trend(&self, report: &TrendReport, json_output: bool) -> Result<()> {
        let text = if json_output {
            self.to_json(report)?
        } else {
            self.render_trend(report)
        };
        println!("{}", text);
        Ok(())
    }

    pub fn display_category_summary(&self, report: &CategorySummaryReport, json_output: bool) -> Result<()> {
        let text = if json_output {
            self.to_json(report)?
        } else {
            self.render_category_summary(report)
        };
        println!("{}", text);
        Ok(())
    }

    pub fn display_categories(&self, categories: &[CategoryConfig], json_output: bool) -> Result<()> {
        let text = if json_output {
            self.to_json(&categories)?
        } else {
            self.render_categories(categories)
        };
        println!("{}", text);
        Ok(())
    }
}
