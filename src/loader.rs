//! Tabular Source Loader
//!
//! Reads the monthly billing exports and decodes them into [`UsageRecord`]s.
//!
//! ## File contract
//!
//! - One file per period and category, named `<YYYYMMDD>-<category>.csv` and
//!   stored under `monthly/` of the source root
//! - The first line is a header and is ignored; blank lines are skipped
//! - Every data line has exactly four fields:
//!   `actor, resource, measurement, cost`
//! - The measurement column is time or capacity depending on the category the
//!   file was requested for
//!
//! Malformed lines are skipped with a warning. A period whose file cannot be
//! fetched degrades to an empty record set; sibling periods still load.
//!
//! ## Sources
//!
//! - [`FileSource`] - exports on the local filesystem
//! - `HttpSource` - exports served over HTTP (feature `remote`)

use crate::error::LoaderError;
use crate::models::{MeasurementKind, Usage, UsageRecord};
use crate::registry::CategoryConfig;
use chrono::NaiveDate;
use futures::future::join_all;
use glob::glob;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing::{debug, warn};

const EXPECTED_FIELDS: usize = 4;
const MONTHLY_DIR: &str = "monthly";

/// `<YYYYMMDD>-<category>.csv`
pub fn source_file_name(date: &str, category_id: &str) -> String {
    format!("{}-{}.csv", date, category_id)
}

fn resource_path(date: &str, category_id: &str) -> String {
    format!("{}/{}", MONTHLY_DIR, source_file_name(date, category_id))
}

/// File date of a monthly export: the first day of the month.
pub fn month_file_date(year: i32, month: u32) -> String {
    format!("{:04}{:02}01", year, month)
}

/// `YYYYMMDD` to `YYYY-MM`.
pub fn period_key_for_file_date(date: &str) -> Result<String, LoaderError> {
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .map(|parsed| parsed.format("%Y-%m").to_string())
        .map_err(|_| LoaderError::InvalidDate(date.to_string()))
}

/// `YYYY-MM` to the export file date of that month.
pub fn file_date_for_period(period_key: &str) -> Result<String, LoaderError> {
    NaiveDate::parse_from_str(&format!("{}-01", period_key), "%Y-%m-%d")
        .map(|parsed| parsed.format("%Y%m%d").to_string())
        .map_err(|_| LoaderError::InvalidDate(period_key.to_string()))
}

/// Where raw CSV text comes from.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    /// Fetch the text of a resource, e.g. `monthly/20240101-actions.csv`.
    async fn fetch(&self, name: &str) -> Result<String, LoaderError>;

    async fn exists(&self, name: &str) -> bool;
}

/// Exports stored below a local directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// File dates present on disk for a category, sorted.
    pub fn discover_dates(&self, category_id: &str) -> anyhow::Result<Vec<String>> {
        let pattern = self
            .root
            .join(MONTHLY_DIR)
            .join(format!("*-{}.csv", category_id));

        let mut dates = Vec::new();
        for entry in glob(&pattern.to_string_lossy())?.flatten() {
            let Some(file_name) = entry.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if let Some((date, _)) = file_name.split_once('-') {
                if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
                    dates.push(date.to_string());
                }
            }
        }

        dates.sort();
        dates.dedup();
        Ok(dates)
    }
}

impl RecordSource for FileSource {
    async fn fetch(&self, name: &str) -> Result<String, LoaderError> {
        let path = self.root.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoaderError::SourceUnavailable {
                name: name.to_string(),
                reason: format!("{} not found", path.display()),
            }),
            Err(source) => Err(LoaderError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    async fn exists(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.root.join(name)).await.unwrap_or(false)
    }
}

/// Exports served below a base URL.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "remote")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

#[cfg(feature = "remote")]
impl RecordSource for HttpSource {
    async fn fetch(&self, name: &str) -> Result<String, LoaderError> {
        let response = self
            .client
            .get(self.url(name))
            .send()
            .await
            .map_err(|source| LoaderError::Http {
                name: name.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LoaderError::SourceUnavailable {
                name: name.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|source| LoaderError::Http {
            name: name.to_string(),
            source,
        })
    }

    async fn exists(&self, name: &str) -> bool {
        self.client
            .head(self.url(name))
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FieldCount(usize),
    InvalidCost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based, the header is line 1
    pub line_number: usize,
    pub reason: SkipReason,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub records: Vec<UsageRecord>,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug)]
pub struct PeriodFailure {
    pub key: String,
    pub error: LoaderError,
}

/// Records per period plus the periods that could not be fetched.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub periods: BTreeMap<String, Vec<UsageRecord>>,
    pub failures: Vec<PeriodFailure>,
}

pub struct CsvLoader<S> {
    source: S,
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| !value.is_nan())
}

impl<S: RecordSource> CsvLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn parse_csv(text: &str, kind: MeasurementKind) -> ParsedCsv {
        let mut parsed = ParsedCsv::default();

        for (index, line) in text.trim().lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let line_number = index + 1;
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != EXPECTED_FIELDS {
                parsed.skipped.push(SkippedLine {
                    line_number,
                    reason: SkipReason::FieldCount(fields.len()),
                    content: line.to_string(),
                });
                continue;
            }

            let Some(cost) = parse_number(fields[3]) else {
                parsed.skipped.push(SkippedLine {
                    line_number,
                    reason: SkipReason::InvalidCost,
                    content: line.to_string(),
                });
                continue;
            };

            parsed.records.push(UsageRecord {
                actor_name: fields[0].to_string(),
                resource_name: fields[1].to_string(),
                cost,
                usage: parse_number(fields[2]).map(|value| Usage { kind, value }),
            });
        }

        parsed
    }

    /// Load one export. `date` is the file date in `YYYYMMDD` form.
    pub async fn load(&self, category: &CategoryConfig, date: &str) -> Result<Vec<UsageRecord>, LoaderError> {
        period_key_for_file_date(date)?;

        let name = resource_path(date, &category.id);
        let text = self.source.fetch(&name).await?;
        let parsed = Self::parse_csv(&text, category.measurement);

        for skipped in &parsed.skipped {
            warn!(
                file = %name,
                line = skipped.line_number,
                reason = ?skipped.reason,
                content = %skipped.content,
                "Skipping malformed CSV line"
            );
        }
        debug!(
            file = %name,
            records = parsed.records.len(),
            skipped = parsed.skipped.len(),
            "Loaded usage export"
        );

        Ok(parsed.records)
    }

    async fn load_keyed(&self, category: &CategoryConfig, requests: Vec<(String, String)>) -> LoadReport {
        let fetches = requests.into_iter().map(|(key, date)| async move {
            let result = self.load(category, &date).await;
            (key, result)
        });

        let mut report = LoadReport::default();
        for (key, result) in join_all(fetches).await {
            match result {
                Ok(records) => {
                    report.periods.insert(key, records);
                }
                Err(error) => {
                    warn!(
                        category = %category.id,
                        period = %key,
                        error = %error,
                        "Failed to load period, treating it as empty"
                    );
                    report.periods.insert(key.clone(), Vec::new());
                    report.failures.push(PeriodFailure { key, error });
                }
            }
        }

        report
    }

    /// Load several exports concurrently, keyed by file date.
    pub async fn load_many(&self, category: &CategoryConfig, dates: &[String]) -> LoadReport {
        let requests = dates.iter().map(|date| (date.clone(), date.clone())).collect();
        self.load_keyed(category, requests).await
    }

    /// Load the twelve monthly exports of `year`, keyed by `YYYY-MM`.
    pub async fn load_year(&self, category: &CategoryConfig, year: i32) -> LoadReport {
        let requests = (1..=12)
            .map(|month| {
                (
                    format!("{:04}-{:02}", year, month),
                    month_file_date(year, month),
                )
            })
            .collect();
        self.load_keyed(category, requests).await
    }

    /// Monthly file dates that exist at the source, sorted.
    pub async fn available_dates(&self, category: &CategoryConfig, years: RangeInclusive<i32>) -> Vec<String> {
        let candidates: Vec<String> = years
            .flat_map(|year| (1..=12).map(move |month| month_file_date(year, month)))
            .collect();

        let probes = candidates.iter().map(|date| async move {
            let present = self.source.exists(&resource_path(date, &category.id)).await;
            (date.clone(), present)
        });

        let mut dates: Vec<String> = join_all(probes)
            .await
            .into_iter()
            .filter_map(|(date, present)| present.then_some(date))
            .collect();
        dates.sort();
        dates
    }
}
