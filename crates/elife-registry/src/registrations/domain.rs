use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::AdminRole;
use crate::validation::ValidationError;

use super::lifecycle::ReviewAction;

/// Store-assigned identifier of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub String);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MobileNumber(String);

impl MobileNumber {
    pub const LENGTH: usize = 10;

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidMobileNumber)
        }
    }

    pub fn is_well_formed(raw: &str) -> bool {
        raw.len() == Self::LENGTH && raw.bytes().all(|byte| byte.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MobileNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MobileNumber> for String {
    fn from(value: MobileNumber) -> Self {
        value.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing lookup key derived from mobile number and applicant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    /// Lookup tokens are matched case-insensitively by upper-casing them.
    pub fn normalized(token: &str) -> Self {
        Self(token.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Approval status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub const fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        RegistrationStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| ValidationError::InvalidStatus(normalized.to_string()))
    }
}

/// One applicant's submission and its approval lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub customer_id: CustomerId,
    pub category: String,
    pub name: String,
    pub address: String,
    pub mobile_number: MobileNumber,
    pub panchayath: String,
    pub ward: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_pro: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw public form payload, validated by the registration service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSubmission {
    pub category: String,
    pub name: String,
    pub address: String,
    pub mobile_number: String,
    pub panchayath: String,
    pub ward: String,
    #[serde(default)]
    pub agent_pro: Option<String>,
}

/// A validated submission ready for insertion. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub customer_id: CustomerId,
    pub category: String,
    pub name: String,
    pub address: String,
    pub mobile_number: MobileNumber,
    pub panchayath: String,
    pub ward: String,
    pub agent_pro: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewRegistration {
    /// Every registration starts pending with `updated_at == created_at`.
    pub fn into_registration(self, id: RegistrationId) -> Registration {
        Registration {
            id,
            customer_id: self.customer_id,
            category: self.category,
            name: self.name,
            address: self.address,
            mobile_number: self.mobile_number,
            panchayath: self.panchayath,
            ward: self.ward,
            agent_pro: self.agent_pro,
            status: RegistrationStatus::Pending,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Named-field update applied by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPatch {
    pub status: Option<RegistrationStatus>,
    pub category: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record written for every status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub registration_id: RegistrationId,
    pub actor: String,
    pub actor_role: AdminRole,
    pub action: ReviewAction,
    pub from: RegistrationStatus,
    pub to: RegistrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Public projection returned by the status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatusView {
    pub customer_id: CustomerId,
    pub name: String,
    pub category: String,
    pub panchayath: String,
    pub ward: String,
    pub status: RegistrationStatus,
    pub applied_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Registration {
    pub fn status_view(&self) -> RegistrationStatusView {
        RegistrationStatusView {
            customer_id: self.customer_id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            panchayath: self.panchayath.clone(),
            ward: self.ward.clone(),
            status: self.status,
            applied_on: self.created_at,
            updated_on: self.updated_at,
        }
    }
}
