//! Usage Analysis Engine
//!
//! [`UsageAnalyzer`] wires the pipeline together: it resolves a category in
//! the registry, loads the matching exports, drops invalid records, runs the
//! aggregators and hands the result to the [`ReportDisplayManager`].
//!
//! ## Pipeline
//!
//! 1. **Resolve**: look up the [`CategoryConfig`] for the requested category
//! 2. **Load**: fetch one export per period, concurrently where possible
//! 3. **Validate**: exclude invalid records, keeping their count
//! 4. **Aggregate**: rank groups, build trends or category summaries
//! 5. **Report**: render for the terminal or as JSON
//!
//! A period that cannot be loaded is reported as missing and treated as
//! empty; it never fails the whole command. An unknown category does.

use crate::aggregator::CostAggregator;
use crate::config::Config;
use crate::display::{CategorySummaryReport, OverviewReport, ReportDisplayManager, TrendReport};
use crate::loader::{file_date_for_period, CsvLoader, RecordSource};
use crate::models::{Dimension, UsageRecord};
use crate::registry::{CategoryConfig, CategoryRegistry};
use crate::trend::TrendAggregator;
use crate::validator::RecordValidator;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A report request, independent of how it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisCommand {
    Overview {
        category: String,
        period_key: String,
        dimension: Dimension,
        limit: Option<usize>,
    },
    Trend {
        category: String,
        year: i32,
        target: String,
        dimension: Dimension,
    },
    Summary {
        period_key: String,
    },
    Categories,
}

impl AnalysisCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisCommand::Overview { .. } => "overview",
            AnalysisCommand::Trend { .. } => "trend",
            AnalysisCommand::Summary { .. } => "summary",
            AnalysisCommand::Categories => "categories",
        }
    }
}

struct ValidatedLoad {
    records: Vec<UsageRecord>,
    dropped: usize,
    available: bool,
}

pub struct UsageAnalyzer<S> {
    registry: CategoryRegistry,
    loader: CsvLoader<S>,
    display_manager: ReportDisplayManager,
    max_items: usize,
}

fn validated(records: Vec<UsageRecord>) -> (Vec<UsageRecord>, usize) {
    let outcome = RecordValidator::filter_and_report(records);
    (outcome.valid, outcome.dropped.len())
}

impl<S: RecordSource> UsageAnalyzer<S> {
    pub fn new(config: &Config, source: S) -> Self {
        Self {
            registry: config.category_registry(),
            loader: CsvLoader::new(source),
            display_manager: ReportDisplayManager::new(config.display.json_pretty),
            max_items: config.display.max_items,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    fn category(&self, id: &str) -> Result<CategoryConfig> {
        self.registry.get(id).with_context(|| {
            format!(
                "Unknown category '{}'. Known categories: {}",
                id,
                self.registry.category_ids().join(", ")
            )
        })
    }

    async fn load_validated(&self, category: &CategoryConfig, date: &str) -> ValidatedLoad {
        match self.loader.load(category, date).await {
            Ok(records) => {
                let (records, dropped) = validated(records);
                ValidatedLoad {
                    records,
                    dropped,
                    available: true,
                }
            }
            Err(error) => {
                warn!(category = %category.id, date = %date, error = %error, "No data available");
                ValidatedLoad {
                    records: Vec::new(),
                    dropped: 0,
                    available: false,
                }
            }
        }
    }

    pub async fn overview(
        &self,
        category_id: &str,
        period_key: &str,
        dimension: Dimension,
        limit: Option<usize>,
    ) -> Result<OverviewReport> {
        let category = self.category(category_id)?;
        let date = file_date_for_period(period_key)?;
        let load = self.load_validated(&category, &date).await;

        let entries = CostAggregator::aggregate_by_dimension(&load.records, dimension, Some(&category));
        let total_groups = entries.len();
        let entries = CostAggregator::limit_to_top(entries, limit.unwrap_or(self.max_items));

        info!(
            category = %category.id,
            period = %period_key,
            groups = total_groups,
            "Overview computed"
        );

        Ok(OverviewReport {
            summary: CostAggregator::summarize(&load.records, Some(&category)),
            category: category.id,
            label: category.label,
            period_key: period_key.to_string(),
            dimension,
            total_groups,
            dropped_records: load.dropped,
            source_available: load.available,
            entries,
        })
    }

    pub async fn trend(
        &self,
        category_id: &str,
        year: i32,
        target: &str,
        dimension: Dimension,
    ) -> Result<TrendReport> {
        let category = self.category(category_id)?;
        let report = self.loader.load_year(&category, year).await;

        let mut dropped_records = 0;
        let periods: BTreeMap<String, Vec<UsageRecord>> = report
            .periods
            .into_iter()
            .map(|(key, records)| {
                let (records, dropped) = validated(records);
                dropped_records += dropped;
                (key, records)
            })
            .collect();

        let points = TrendAggregator::monthly_trend_with_usage(&periods, target, dimension, &category);

        Ok(TrendReport {
            category: category.id,
            label: category.label,
            target: target.to_string(),
            dimension,
            points,
            dropped_records,
            failed_periods: report.failures.into_iter().map(|failure| failure.key).collect(),
        })
    }

    pub async fn category_summary(&self, period_key: &str) -> Result<CategorySummaryReport> {
        let date = file_date_for_period(period_key)?;
        let categories = self.registry.snapshot();

        let loads = join_all(
            categories
                .iter()
                .map(|category| self.load_validated(category, &date)),
        )
        .await;

        let mut failed_categories = Vec::new();
        let mut dropped_records = 0;
        let mut per_category: Vec<(String, Vec<UsageRecord>)> = Vec::with_capacity(loads.len());
        for (category, load) in categories.iter().zip(loads) {
            if !load.available {
                failed_categories.push(category.id.clone());
            }
            dropped_records += load.dropped;
            per_category.push((category.id.clone(), load.records));
        }

        Ok(CategorySummaryReport {
            period_key: period_key.to_string(),
            categories: TrendAggregator::category_summary(per_category.iter().map(|(id, records)| (id, records))),
            dropped_records,
            failed_categories,
        })
    }

    pub async fn run_command(&self, command: &AnalysisCommand, json_output: bool) -> Result<()> {
        match command {
            AnalysisCommand::Overview {
                category,
                period_key,
                dimension,
                limit,
            } => {
                let report = self.overview(category, period_key, *dimension, *limit).await?;
                self.display_manager.display_overview(&report, json_output)
            }
            AnalysisCommand::Trend {
                category,
                year,
                target,
                dimension,
            } => {
                let report = self.trend(category, *year, target, *dimension).await?;
                self.display_manager.display_trend(&report, json_output)
            }
            AnalysisCommand::Summary { period_key } => {
                let report = self.category_summary(period_key).await?;
                self.display_manager.display_category_summary(&report, json_output)
            }
            AnalysisCommand::Categories => {
                let categories = self.registry.get_all();
                self.display_manager.display_categories(&categories, json_output)
            }
        }
    }
}
