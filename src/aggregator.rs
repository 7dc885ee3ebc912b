//! Cost and Usage Aggregation
//!
//! Groups usage records by actor or resource, sums cost and the category's
//! measurement, and ranks the groups by cost share. All functions are pure and
//! total: empty input gives empty or zero output, never an error.
//!
//! ## Ordering
//!
//! [`CostAggregator::aggregate_by_dimension`] returns groups by descending
//! total cost. The sort is stable, so groups with equal cost stay in the order
//! their first record appeared.
//!
//! ## Free quota
//!
//! When a category has a free quota, each group's usage is expressed as a
//! percentage of the quota limit. The value is not clamped: anything above
//! 100 is overage.

use crate::models::{AggregatedEntry, DataSummary, Dimension, UsageRecord};
use crate::registry::CategoryConfig;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub struct CostAggregator;

#[derive(Debug, Default, Clone, Copy)]
struct GroupTotals {
    cost: f64,
    usage: f64,
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

impl CostAggregator {
    pub fn aggregate_by_dimension(
        records: &[UsageRecord],
        dimension: Dimension,
        config: Option<&CategoryConfig>,
    ) -> Vec<AggregatedEntry> {
        let measurement = config.map(|config| config.measurement);

        // Groups in first-encounter order, with an index for lookups
        let mut groups: Vec<(&str, GroupTotals)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let key = dimension.key(record);
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((key, GroupTotals::default()));
                groups.len() - 1
            });

            let totals = &mut groups[slot].1;
            totals.cost += record.cost;
            if let Some(kind) = measurement {
                totals.usage += record.usage_of(kind).unwrap_or(0.0);
            }
        }

        let total_cost = groups.iter().fold(0.0, |acc, (_, totals)| acc + totals.cost);
        let quota_limit = config
            .and_then(|config| config.free_quota.as_ref())
            .map(|quota| quota.limit)
            .filter(|limit| *limit > 0.0);

        let mut entries: Vec<AggregatedEntry> = groups
            .into_iter()
            .map(|(name, totals)| AggregatedEntry {
                group_name: name.to_string(),
                total_cost: totals.cost,
                percentage_of_total: percentage(totals.cost, total_cost),
                total_usage: config.map(|_| totals.usage),
                usage_unit: config.map(|config| config.unit.clone()),
                free_quota_usage_percent: quota_limit.map(|limit| totals.usage / limit * 100.0),
            })
            .collect();

        entries.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));

        debug!(
            records = records.len(),
            groups = entries.len(),
            dimension = %dimension,
            total_cost = total_cost,
            "Aggregated usage records"
        );

        entries
    }

    pub fn filter_by_group_name(
        records: &[UsageRecord],
        name: &str,
        dimension: Dimension,
    ) -> Vec<UsageRecord> {
        records
            .iter()
            .filter(|record| dimension.key(record) == name)
            .cloned()
            .collect()
    }

    /// Keep the first `max_count` entries of an already ranked list.
    pub fn limit_to_top(mut entries: Vec<AggregatedEntry>, max_count: usize) -> Vec<AggregatedEntry> {
        entries.truncate(max_count);
        entries
    }

    pub fn total_cost(records: &[UsageRecord]) -> f64 {
        // fold from +0.0; `Sum` for f64 starts at -0.0
        records.iter().fold(0.0, |acc, record| acc + record.cost)
    }

    /// Percentage of the category free quota consumed by `records`.
    ///
    /// `None` when the category has no free quota. A limit of zero yields
    /// `Some(0.0)` rather than a division by zero.
    pub fn free_quota_usage_percent(records: &[UsageRecord], config: &CategoryConfig) -> Option<f64> {
        let quota = config.free_quota.as_ref()?;

        if quota.limit == 0.0 {
            return Some(0.0);
        }

        let usage = records
            .iter()
            .filter_map(|record| record.usage_of(quota.measurement))
            .fold(0.0, |acc, value| acc + value);

        Some(usage / quota.limit * 100.0)
    }

    /// Distinct actor or resource names, sorted.
    pub fn unique_group_names(records: &[UsageRecord], dimension: Dimension) -> Vec<String> {
        records
            .iter()
            .map(|record| dimension.key(record))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn summarize(records: &[UsageRecord], config: Option<&CategoryConfig>) -> DataSummary {
        DataSummary {
            total_cost: Self::total_cost(records),
            item_count: records.len(),
            free_quota_usage_percent: config
                .and_then(|config| Self::free_quota_usage_percent(records, config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementKind;

    fn sample_records() -> Vec<UsageRecord> {
        vec![
            UsageRecord::new("john", "repo1", 5.0).with_time(10.0),
            UsageRecord::new("jane", "repo2", 8.0).with_time(20.0),
            UsageRecord::new("john", "repo2", 3.0).with_time(15.0),
            UsageRecord::new("jane", "repo1", 2.0).with_capacity(100.0),
        ]
    }

    fn actions() -> CategoryConfig {
        CategoryConfig::new("actions", "GitHub Actions", MeasurementKind::Time, "min")
            .with_free_quota(50_000.0)
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }

    #[test]
    fn test_aggregate_by_actor() {
        let entries = CostAggregator::aggregate_by_dimension(&sample_records(), Dimension::Actor, None);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].group_name, "jane");
        assert_eq!(entries[0].total_cost, 10.0);
        assert_eq!(round2(entries[0].percentage_of_total), 55.56);
        assert_eq!(entries[1].group_name, "john");
        assert_eq!(entries[1].total_cost, 8.0);
        assert_eq!(round2(entries[1].percentage_of_total), 44.44);
        assert!(entries[0].total_usage.is_none());
        assert!(entries[0].usage_unit.is_none());
    }

    #[test]
    fn test_aggregate_by_resource_with_usage() {
        let config = actions();
        let entries =
            CostAggregator::aggregate_by_dimension(&sample_records(), Dimension::Resource, Some(&config));

        assert_eq!(entries[0].group_name, "repo2");
        assert_eq!(entries[0].total_cost, 11.0);
        assert_eq!(entries[0].total_usage, Some(35.0));
        assert_eq!(entries[0].usage_unit.as_deref(), Some("min"));
        assert_eq!(entries[0].free_quota_usage_percent, Some(35.0 / 50_000.0 * 100.0));

        // the capacity figure on jane/repo1 does not count towards time
        assert_eq!(entries[1].group_name, "repo1");
        assert_eq!(entries[1].total_usage, Some(10.0));
    }

    #[test]
    fn test_quota_percent_is_not_clamped() {
        let config = CategoryConfig::new("actions", "Actions", MeasurementKind::Time, "min")
            .with_free_quota(10.0);
        let records = vec![UsageRecord::new("john", "repo1", 1.0).with_time(25.0)];
        let entries = CostAggregator::aggregate_by_dimension(&records, Dimension::Actor, Some(&config));
        assert_eq!(entries[0].free_quota_usage_percent, Some(250.0));
    }

    #[test]
    fn test_zero_limit_leaves_entry_quota_unset() {
        let config = actions().with_free_quota(0.0);
        let entries =
            CostAggregator::aggregate_by_dimension(&sample_records(), Dimension::Actor, Some(&config));
        assert!(entries.iter().all(|entry| entry.free_quota_usage_percent.is_none()));
    }

    #[test]
    fn test_equal_costs_keep_encounter_order() {
        let records = vec![
            UsageRecord::new("carol", "repo1", 4.0),
            UsageRecord::new("alice", "repo1", 4.0),
            UsageRecord::new("bob", "repo1", 9.0),
            UsageRecord::new("dave", "repo1", 4.0),
        ];
        let entries = CostAggregator::aggregate_by_dimension(&records, Dimension::Actor, None);
        let names: Vec<&str> = entries.iter().map(|e| e.group_name.as_str()).collect();
        assert_eq!(names, vec!["bob", "carol", "alice", "dave"]);
    }

    #[test]
    fn test_zero_total_cost_gives_zero_percentages() {
        let records = vec![
            UsageRecord::new("john", "repo1", 0.0),
            UsageRecord::new("jane", "repo1", 0.0),
        ];
        let entries = CostAggregator::aggregate_by_dimension(&records, Dimension::Actor, None);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.percentage_of_total == 0.0));
    }

    #[test]
    fn test_grouping_is_case_sensitive() {
        let records = vec![
            UsageRecord::new("John", "repo1", 1.0),
            UsageRecord::new("john", "repo1", 1.0),
        ];
        let entries = CostAggregator::aggregate_by_dimension(&records, Dimension::Actor, None);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let config = actions();
        assert!(CostAggregator::aggregate_by_dimension(&[], Dimension::Actor, Some(&config)).is_empty());
        assert_eq!(CostAggregator::total_cost(&[]), 0.0);
        assert_eq!(CostAggregator::free_quota_usage_percent(&[], &config), Some(0.0));

        let no_quota = CategoryConfig::new("codespaces", "Codespaces", MeasurementKind::Time, "min");
        assert_eq!(CostAggregator::free_quota_usage_percent(&[], &no_quota), None);
    }

    #[test]
    fn test_empty_totals_are_positive_zero() {
        let config = actions();
        assert!(CostAggregator::total_cost(&[]).is_sign_positive());
        assert!(CostAggregator::free_quota_usage_percent(&[], &config)
            .unwrap()
            .is_sign_positive());

        let summary = CostAggregator::summarize(&[], Some(&config));
        assert!(summary.total_cost.is_sign_positive());
        assert!(summary.free_quota_usage_percent.unwrap().is_sign_positive());

        // records with no usage of the quota kind
        let records = vec![UsageRecord::new("john", "repo1", 0.0)];
        assert!(CostAggregator::free_quota_usage_percent(&records, &config)
            .unwrap()
            .is_sign_positive());
    }

    #[test]
    fn test_filter_by_group_name() {
        let records = sample_records();
        let john = CostAggregator::filter_by_group_name(&records, "john", Dimension::Actor);
        assert_eq!(john.len(), 2);
        assert_eq!(john[0].resource_name, "repo1");
        assert_eq!(john[1].resource_name, "repo2");
        assert_eq!(CostAggregator::total_cost(&john), 8.0);

        assert!(CostAggregator::filter_by_group_name(&records, "JOHN", Dimension::Actor).is_empty());
    }

    #[test]
    fn test_limit_to_top() {
        let entries = CostAggregator::aggregate_by_dimension(&sample_records(), Dimension::Actor, None);
        let top = CostAggregator::limit_to_top(entries.clone(), 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].group_name, "jane");
        assert_eq!(CostAggregator::limit_to_top(entries.clone(), 10), entries);
    }

    #[test]
    fn test_free_quota_usage_percent() {
        let records = vec![
            UsageRecord::new("john", "repo1", 1.0).with_time(1000.0),
            UsageRecord::new("jane", "repo2", 1.0).with_time(2000.0),
            UsageRecord::new("bob", "repo3", 1.0),
        ];
        let percent = CostAggregator::free_quota_usage_percent(&records, &actions()).unwrap();
        assert!((percent - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_unique_group_names_sorted() {
        let records = sample_records();
        assert_eq!(CostAggregator::unique_group_names(&records, Dimension::Actor), vec!["jane", "john"]);
        assert_eq!(
            CostAggregator::unique_group_names(&records, Dimension::Resource),
            vec!["repo1", "repo2"]
        );
    }

    #[test]
    fn test_summarize() {
        let records = sample_records();
        let summary = CostAggregator::summarize(&records, Some(&actions()));
        assert_eq!(summary.total_cost, 18.0);
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.free_quota_usage_percent, Some(45.0 / 50_000.0 * 100.0));

        let empty = CostAggregator::summarize(&[], None);
        assert_eq!(empty.total_cost, 0.0);
        assert_eq!(empty.item_count, 0);
        assert_eq!(empty.free_quota_usage_percent, None);
    }
}
