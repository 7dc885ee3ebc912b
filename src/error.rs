//! Error taxonomy
//!
//! Record and configuration problems are reported as values inside a
//! [`Validation`] so callers can surface every error at once. Loader failures
//! are scoped to a single period and never abort sibling fetches.

use serde::Serialize;
use thiserror::Error;

/// Why a usage record was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("actor name is empty")]
    EmptyActorName,
    #[error("resource name is empty")]
    EmptyResourceName,
    #[error("cost is not a finite non-negative number")]
    InvalidCost,
    #[error("time usage is not a finite non-negative number")]
    InvalidTimeUsage,
    #[error("capacity usage is not a finite non-negative number")]
    InvalidCapacityUsage,
}

/// Why a category configuration is malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigurationError {
    #[error("category id is empty")]
    EmptyId,
    #[error("category label is empty")]
    EmptyLabel,
    #[error("category unit is empty")]
    EmptyUnit,
    #[error("free quota limit must be a non-negative number")]
    NegativeQuotaLimit,
    #[error("free quota belongs to a different category")]
    QuotaCategoryMismatch,
    #[error("free quota measures a different field than its category")]
    QuotaMeasurementMismatch,
    #[error("free quota unit differs from its category unit")]
    QuotaUnitMismatch,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("source {name} is unavailable: {reason}")]
    SourceUnavailable { name: String, reason: String },

    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file date {0}, expected YYYYMMDD")]
    InvalidDate(String),

    #[cfg(feature = "remote")]
    #[error("request for {name} failed: {source}")]
    Http {
        name: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a validation pass: valid when no error fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation<E> {
    pub errors: Vec<E>,
}

impl<E> Validation<E> {
    pub fn from_errors(errors: Vec<E>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E> Default for Validation<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}
