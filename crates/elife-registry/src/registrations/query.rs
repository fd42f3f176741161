//! Read-only views over an immutable snapshot of the registration collection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Registration, RegistrationStatus};
use crate::validation::ValidationError;

/// Equality filter; omitted criteria impose no constraint and set criteria are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panchayath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RegistrationStatus>,
}

impl RegistrationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(Some(category.into()));
        self
    }

    pub fn with_panchayath(mut self, panchayath: impl Into<String>) -> Self {
        self.panchayath = non_blank(Some(panchayath.into()));
        self
    }

    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds a filter from loosely typed form values where `""` means "any".
    pub fn from_params(
        category: Option<String>,
        panchayath: Option<String>,
        status: Option<String>,
    ) -> Result<Self, ValidationError> {
        let status = match non_blank(status) {
            Some(raw) => Some(raw.parse::<RegistrationStatus>()?),
            None => None,
        };
        Ok(Self {
            category: non_blank(category),
            panchayath: non_blank(panchayath),
            status,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.panchayath.is_none() && self.status.is_none()
    }

    pub fn matches(&self, registration: &Registration) -> bool {
        let category = self
            .category
            .as_deref()
            .map_or(true, |category| registration.category == category);
        let panchayath = self
            .panchayath
            .as_deref()
            .map_or(true, |panchayath| registration.panchayath == panchayath);
        let status = self
            .status
            .map_or(true, |status| registration.status == status);
        category && panchayath && status
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Keeps matching records in their input order.
pub fn filter_registrations(
    records: &[Registration],
    filter: &RegistrationFilter,
) -> Vec<Registration> {
    records
        .iter()
        .filter(|registration| filter.matches(registration))
        .cloned()
        .collect()
}

/// Distinct filter options in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub panchayaths: Vec<String>,
}

impl Facets {
    pub fn from_records(records: &[Registration]) -> Self {
        Self {
            categories: distinct(records.iter().map(|record| record.category.as_str())),
            panchayaths: distinct(records.iter().map(|record| record.panchayath.as_str())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

/// Status counts over a set of registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RegistrationStats {
    pub fn from_records(records: &[Registration]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status {
                RegistrationStatus::Pending => stats.pending += 1,
                RegistrationStatus::Approved => stats.approved += 1,
                RegistrationStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
    }
}

/// The full collection as read at one point in time, newest first.
///
/// Never mutated; refresh by taking a new snapshot.
#[derive(Debug, Clone)]
pub struct RegistrationSnapshot {
    records: Vec<Registration>,
    taken_at: DateTime<Utc>,
}

impl RegistrationSnapshot {
    /// Orders by `created_at` descending. The sort is stable, so ties keep the order
    /// the store returned them in.
    pub fn new(mut records: Vec<Registration>, taken_at: DateTime<Utc>) -> Self {
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Self { records, taken_at }
    }

    pub fn records(&self) -> &[Registration] {
        &self.records
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter(&self, filter: &RegistrationFilter) -> Vec<Registration> {
        filter_registrations(&self.records, filter)
    }

    /// Options come from the unfiltered collection so narrowing never hides them.
    pub fn facets(&self) -> Facets {
        Facets::from_records(&self.records)
    }

    pub fn stats(&self) -> RegistrationStats {
        RegistrationStats::from_records(&self.records)
    }
}
