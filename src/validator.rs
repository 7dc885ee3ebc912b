//! Record validation
//!
//! Every rule is checked independently, so one record can fail several at
//! once. Invalid records are dropped from a batch but the batch always
//! completes; drops are logged and can be collected with
//! [`RecordValidator::partition_valid`].

use crate::error::{Validation, ValidationError};
use crate::models::{MeasurementKind, UsageRecord};
use tracing::{debug, warn};

pub struct RecordValidator;

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    pub record: UsageRecord,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub valid: Vec<UsageRecord>,
    pub dropped: Vec<DroppedRecord>,
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl RecordValidator {
    pub fn validate(record: &UsageRecord) -> Validation<ValidationError> {
        let mut errors = Vec::new();

        if record.actor_name.trim().is_empty() {
            errors.push(ValidationError::EmptyActorName);
        }
        if record.resource_name.trim().is_empty() {
            errors.push(ValidationError::EmptyResourceName);
        }
        if !is_non_negative(record.cost) {
            errors.push(ValidationError::InvalidCost);
        }

        if let Some(usage) = record.usage {
            if !is_non_negative(usage.value) {
                errors.push(match usage.kind {
                    MeasurementKind::Time => ValidationError::InvalidTimeUsage,
                    MeasurementKind::Capacity => ValidationError::InvalidCapacityUsage,
                });
            }
        }

        Validation::from_errors(errors)
    }

    /// Split a batch into valid records and dropped ones with their reasons.
    pub fn partition_valid<I>(records: I) -> FilterOutcome
    where
        I: IntoIterator<Item = UsageRecord>,
    {
        let mut outcome = FilterOutcome::default();

        for record in records {
            let validation = Self::validate(&record);
            if validation.is_valid() {
                outcome.valid.push(record);
            } else {
                outcome.dropped.push(DroppedRecord {
                    record,
                    errors: validation.errors,
                });
            }
        }

        outcome
    }

    /// Partition a batch, logging each dropped record with its reasons and
    /// then the dropped count.
    pub fn filter_and_report<I>(records: I) -> FilterOutcome
    where
        I: IntoIterator<Item = UsageRecord>,
    {
        let outcome = Self::partition_valid(records);

        for dropped in &outcome.dropped {
            warn!(
                actor = %dropped.record.actor_name,
                resource = %dropped.record.resource_name,
                errors = ?dropped.errors,
                "Dropping invalid usage record"
            );
        }
        if !outcome.dropped.is_empty() {
            warn!(
                dropped = outcome.dropped.len(),
                kept = outcome.valid.len(),
                "Invalid usage records excluded from batch"
            );
        } else {
            debug!(kept = outcome.valid.len(), "All usage records valid");
        }

        outcome
    }

    /// Keep only valid records, logging each one that is dropped.
    pub fn filter_valid<I>(records: I) -> Vec<UsageRecord>
    where
        I: IntoIterator<Item = UsageRecord>,
    {
        Self::filter_and_report(records).valid
    }
}
