//! Multi-period aggregation
//!
//! Combines per-month record sets into trend series for a single actor or
//! resource, and per-category record sets into a cost summary.
//!
//! Period maps are accepted as any iterator of `(key, records)` pairs, so a
//! `HashMap`, a `BTreeMap` or an explicit list all work. Trend output is always
//! sorted by period key; `YYYY-MM` keys sort chronologically as strings.

use crate::aggregator::CostAggregator;
use crate::models::{CategorySummary, Dimension, MeasurementKind, MonthlyTrendPoint, UsageRecord};
use crate::registry::CategoryConfig;

pub struct TrendAggregator;

/// Usage of a record set whose kind is not known up front. Time wins when
/// both kinds appear.
fn detected_usage(records: &[UsageRecord]) -> Option<f64> {
    let kind = if records.iter().any(|r| r.time_usage().is_some()) {
        MeasurementKind::Time
    } else if records.iter().any(|r| r.capacity_usage().is_some()) {
        MeasurementKind::Capacity
    } else {
        return None;
    };

    Some(
        records
            .iter()
            .filter_map(|r| r.usage_of(kind))
            .fold(0.0, |acc, value| acc + value),
    )
}

impl TrendAggregator {
    pub fn yearly_trend<'a, I>(periods: I, target: &str, dimension: Dimension) -> Vec<MonthlyTrendPoint>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<UsageRecord>)>,
    {
        let mut points: Vec<MonthlyTrendPoint> = periods
            .into_iter()
            .map(|(period_key, records)| {
                let matching = CostAggregator::filter_by_group_name(records, target, dimension);
                MonthlyTrendPoint {
                    period_key: period_key.clone(),
                    cost: CostAggregator::total_cost(&matching),
                    record_count: matching.len(),
                    usage: detected_usage(&matching),
                    usage_unit: None,
                    free_quota_usage_percent: None,
                }
            })
            .collect();

        points.sort_by(|a, b| a.period_key.cmp(&b.period_key));
        points
    }

    /// Trend with usage measured by the given category.
    pub fn monthly_trend_with_usage<'a, I>(
        periods: I,
        target: &str,
        dimension: Dimension,
        config: &CategoryConfig,
    ) -> Vec<MonthlyTrendPoint>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<UsageRecord>)>,
    {
        let quota_limit = config
            .free_quota
            .as_ref()
            .map(|quota| quota.limit)
            .filter(|limit| *limit > 0.0);

        let mut points: Vec<MonthlyTrendPoint> = periods
            .into_iter()
            .map(|(period_key, records)| {
                let matching = CostAggregator::filter_by_group_name(records, target, dimension);
                let usage = matching
                    .iter()
                    .filter_map(|r| r.usage_of(config.measurement))
                    .fold(0.0, |acc, value| acc + value);

                MonthlyTrendPoint {
                    period_key: period_key.clone(),
                    cost: CostAggregator::total_cost(&matching),
                    record_count: matching.len(),
                    usage: Some(usage),
                    usage_unit: Some(config.unit.clone()),
                    free_quota_usage_percent: quota_limit.map(|limit| usage / limit * 100.0),
                }
            })
            .collect();

        points.sort_by(|a, b| a.period_key.cmp(&b.period_key));
        points
    }

    /// Total cost per category, most expensive first. Ties keep input order.
    pub fn category_summary<'a, I>(categories: I) -> Vec<CategorySummary>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<UsageRecord>)>,
    {
        let mut summary: Vec<CategorySummary> = categories
            .into_iter()
            .map(|(category, records)| CategorySummary {
                category: category.clone(),
                total_cost: CostAggregator::total_cost(records),
                item_count: records.len(),
            })
            .collect();

        summary.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
        summary
    }

    /// Period keys that hold at least one record, ascending.
    pub fn populated_periods<'a, I>(periods: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<UsageRecord>)>,
    {
        let mut keys: Vec<String> = periods
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
