//! Billing Usage Library
//!
//! Turns organization usage-billing exports (compute minutes, storage
//! capacity) into per-user and per-repository cost breakdowns, free-quota
//! consumption and monthly trends.
//!
//! ## Core Features
//!
//! - **Record validation**: structural checks that drop bad rows without
//!   aborting a batch
//! - **Cost ranking**: group by user or repository with percentage shares
//! - **Free-quota tracking**: usage as a share of the category allowance,
//!   overage included
//! - **Trends**: month-by-month series and cross-category summaries
//! - **CSV loading**: concurrent per-month loading where a missing month
//!   degrades to an empty one
//!
//! ## Architecture Overview
//!
//! - [`models`] - Usage records and aggregation results
//! - [`error`] - Validation, configuration and loader error types
//! - [`validator`] - Record validation
//! - [`aggregator`] - Grouping, percentages and free-quota ratios
//! - [`trend`] - Multi-period trends and category summaries
//! - [`registry`] - Billing category definitions
//! - [`loader`] - CSV export decoding and retrieval
//! - [`analyzer`] - Pipeline orchestration for the CLI
//! - [`display`] - Terminal and JSON reports
//! - [`config`] - Configuration with file and environment support
//! - [`logging`] - Structured logging setup
//!
//! ## Example
//!
//! ```rust
//! use billing_usage::{CategoryRegistry, CostAggregator, Dimension, UsageRecord};
//!
//! let registry = CategoryRegistry::seeded();
//! let actions = registry.get("actions").unwrap();
//!
//! let records = vec![
//!     UsageRecord::new("john", "repo1", 5.0).with_time(10.0),
//!     UsageRecord::new("jane", "repo2", 8.0).with_time(20.0),
//! ];
//!
//! let ranking = CostAggregator::aggregate_by_dimension(&records, Dimension::Actor, Some(&actions));
//! assert_eq!(ranking[0].group_name, "jane");
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod display;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod registry;
pub mod trend;
pub mod validator;

pub use aggregator::CostAggregator;
pub use analyzer::UsageAnalyzer;
pub use models::*;
pub use registry::{CategoryConfig, CategoryRegistry, FreeQuota};
pub use trend::TrendAggregator;
pub use validator::RecordValidator;
