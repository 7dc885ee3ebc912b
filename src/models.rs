//! Core Data Models
//!
//! This module defines the data structures that flow through the billing usage
//! pipeline, from raw CSV records to the aggregated views handed to reports.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`UsageRecord`] - One line of a billing CSV export
//! 2. **Grouping**: [`AggregatedEntry`] - Cost and usage per actor or resource
//! 3. **Trends**: [`MonthlyTrendPoint`] - One point per reporting period
//! 4. **Summaries**: [`CategorySummary`], [`DataSummary`] - Headline figures
//!
//! ## Measurement
//!
//! A record carries at most one usage figure. Which one depends on the billing
//! category: compute categories are measured in time, storage in capacity.
//! [`MeasurementKind`] is resolved once per category and every aggregation
//! dispatches on it instead of looking fields up by name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement field of a billing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Time,
    Capacity,
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementKind::Time => write!(f, "time"),
            MeasurementKind::Capacity => write!(f, "capacity"),
        }
    }
}

/// Grouping axis for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Group by the user that incurred the cost
    Actor,
    /// Group by the repository the cost was billed to
    Resource,
}

impl Dimension {
    /// Key of `record` along this dimension.
    pub fn key<'a>(&self, record: &'a UsageRecord) -> &'a str {
        match self {
            Dimension::Actor => &record.actor_name,
            Dimension::Resource => &record.resource_name,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Actor => write!(f, "actor"),
            Dimension::Resource => write!(f, "resource"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub kind: MeasurementKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "actorName")]
    pub actor_name: String,
    #[serde(rename = "resourceName")]
    pub resource_name: String,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl UsageRecord {
    pub fn new(actor_name: impl Into<String>, resource_name: impl Into<String>, cost: f64) -> Self {
        Self {
            actor_name: actor_name.into(),
            resource_name: resource_name.into(),
            cost,
            usage: None,
        }
    }

    pub fn with_time(mut self, minutes: f64) -> Self {
        self.usage = Some(Usage {
            kind: MeasurementKind::Time,
            value: minutes,
        });
        self
    }

    pub fn with_capacity(mut self, megabytes: f64) -> Self {
        self.usage = Some(Usage {
            kind: MeasurementKind::Capacity,
            value: megabytes,
        });
        self
    }

    /// Usage value if the record carries a figure of the given kind.
    pub fn usage_of(&self, kind: MeasurementKind) -> Option<f64> {
        self.usage
            .filter(|usage| usage.kind == kind)
            .map(|usage| usage.value)
    }

    pub fn time_usage(&self) -> Option<f64> {
        self.usage_of(MeasurementKind::Time)
    }

    pub fn capacity_usage(&self) -> Option<f64> {
        self.usage_of(MeasurementKind::Capacity)
    }
}

/// Cost and usage of one actor or resource within a single aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    #[serde(rename = "groupName")]
    pub group_name: String,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "percentageOfTotal")]
    pub percentage_of_total: f64,
    #[serde(rename = "totalUsage", skip_serializing_if = "Option::is_none")]
    pub total_usage: Option<f64>,
    #[serde(rename = "usageUnit", skip_serializing_if = "Option::is_none")]
    pub usage_unit: Option<String>,
    /// Share of the category free quota consumed; above 100 means overage.
    #[serde(rename = "freeQuotaUsagePercent", skip_serializing_if = "Option::is_none")]
    pub free_quota_usage_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    /// Reporting period in `YYYY-MM` form
    #[serde(rename = "periodKey")]
    pub period_key: String,
    pub cost: f64,
    #[serde(rename = "recordCount")]
    pub record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<f64>,
    #[serde(rename = "usageUnit", skip_serializing_if = "Option::is_none")]
    pub usage_unit: Option<String>,
    #[serde(rename = "freeQuotaUsagePercent", skip_serializing_if = "Option::is_none")]
    pub free_quota_usage_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "itemCount")]
    pub item_count: usize,
}

/// Headline figures for one record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    #[serde(rename = "itemCount")]
    pub item_count: usize,
    #[serde(rename = "freeQuotaUsagePercent")]
    pub free_quota_usage_percent: Option<f64>,
}
