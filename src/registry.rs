//! Category Configuration Registry
//!
//! Maps a billing category id to its measurement field, unit and optional free
//! quota. The registry is an ordinary value: construct it once, share it by
//! reference, and pass the [`CategoryConfig`] you need into the aggregators.
//!
//! Reads take an [`Arc`] snapshot of the whole list, so a concurrent
//! [`CategoryRegistry::upsert`] never exposes a half-written entry and readers
//! never block each other for longer than the pointer clone.

use crate::error::{ConfigurationError, Validation};
use crate::models::MeasurementKind;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeQuota {
    /// Id of the category this quota belongs to
    pub category: String,
    pub limit: f64,
    pub unit: String,
    pub measurement: MeasurementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    pub id: String,
    pub label: String,
    pub measurement: MeasurementKind,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_quota: Option<FreeQuota>,
}

impl CategoryConfig {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        measurement: MeasurementKind,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            measurement,
            unit: unit.into(),
            free_quota: None,
        }
    }

    /// Attach a free quota consistent with this category.
    pub fn with_free_quota(mut self, limit: f64) -> Self {
        self.free_quota = Some(FreeQuota {
            category: self.id.clone(),
            limit,
            unit: self.unit.clone(),
            measurement: self.measurement,
        });
        self
    }
}

/// Categories known out of the box.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("actions", "GitHub Actions", MeasurementKind::Time, "min")
            .with_free_quota(50_000.0),
        CategoryConfig::new("codespaces", "Codespaces", MeasurementKind::Time, "min"),
        // 50 GB
        CategoryConfig::new("storage", "Storage", MeasurementKind::Capacity, "MB")
            .with_free_quota(51_200.0),
    ]
}

pub struct CategoryRegistry {
    configs: RwLock<Arc<Vec<CategoryConfig>>>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl CategoryRegistry {
    pub fn seeded() -> Self {
        Self::with_configs(default_categories())
    }

    /// Build a registry from an explicit list. A later entry with the same id
    /// replaces an earlier one.
    pub fn with_configs(configs: Vec<CategoryConfig>) -> Self {
        let registry = Self {
            configs: RwLock::new(Arc::new(Vec::with_capacity(configs.len()))),
        };
        registry.replace_all(configs);
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, Arc<Vec<CategoryConfig>>> {
        self.configs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<Vec<CategoryConfig>>> {
        self.configs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current list of categories, in registration order.
    pub fn snapshot(&self) -> Arc<Vec<CategoryConfig>> {
        Arc::clone(&self.read())
    }

    pub fn get(&self, id: &str) -> Option<CategoryConfig> {
        self.read().iter().find(|config| config.id == id).cloned()
    }

    pub fn get_all(&self) -> Vec<CategoryConfig> {
        self.snapshot().as_ref().clone()
    }

    /// Insert a category or replace the one with the same id. The whole
    /// object is replaced; nothing is merged.
    pub fn upsert(&self, config: CategoryConfig) {
        let mut guard = self.write();
        let mut next = guard.as_ref().clone();
        match next.iter_mut().find(|existing| existing.id == config.id) {
            Some(existing) => *existing = config,
            None => next.push(config),
        }
        *guard = Arc::new(next);
    }

    /// Swap in a new category list wholesale.
    pub fn replace_all(&self, configs: Vec<CategoryConfig>) {
        let mut next: Vec<CategoryConfig> = Vec::with_capacity(configs.len());
        for config in configs {
            match next.iter_mut().find(|existing| existing.id == config.id) {
                Some(existing) => *existing = config,
                None => next.push(config),
            }
        }
        debug!(categories = next.len(), "Category registry loaded");
        *self.write() = Arc::new(next);
    }

    pub fn validate(config: &CategoryConfig) -> Validation<ConfigurationError> {
        let mut errors = Vec::new();

        if config.id.trim().is_empty() {
            errors.push(ConfigurationError::EmptyId);
        }
        if config.label.trim().is_empty() {
            errors.push(ConfigurationError::EmptyLabel);
        }
        if config.unit.trim().is_empty() {
            errors.push(ConfigurationError::EmptyUnit);
        }

        if let Some(quota) = &config.free_quota {
            if !(quota.limit.is_finite() && quota.limit >= 0.0) {
                errors.push(ConfigurationError::NegativeQuotaLimit);
            }
            if quota.category != config.id {
                errors.push(ConfigurationError::QuotaCategoryMismatch);
            }
            if quota.measurement != config.measurement {
                errors.push(ConfigurationError::QuotaMeasurementMismatch);
            }
            if quota.unit != config.unit {
                errors.push(ConfigurationError::QuotaUnitMismatch);
            }
        }

        Validation::from_errors(errors)
    }

    pub fn has_free_quota(&self, id: &str) -> bool {
        self.read()
            .iter()
            .any(|config| config.id == id && config.free_quota.is_some())
    }

    pub fn category_ids(&self) -> Vec<String> {
        self.read().iter().map(|config| config.id.clone()).collect()
    }

    /// Display label, or the id itself for unknown categories.
    pub fn label_for(&self, id: &str) -> String {
        self.get(id)
            .map(|config| config.label)
            .unwrap_or_else(|| id.to_string())
    }

    /// Usage unit, or an empty string for unknown categories.
    pub fn unit_for(&self, id: &str) -> String {
        self.get(id).map(|config| config.unit).unwrap_or_default()
    }

    pub fn free_quota_for(&self, id: &str) -> Option<FreeQuota> {
        self.get(id).and_then(|config| config.free_quota)
    }
}
