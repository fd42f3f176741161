use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{require_fields, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanchayathId(pub String);

impl fmt::Display for PanchayathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A programme track applicants register under. Fees are whole rupees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub actual_fee: u32,
    pub offer_fee: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn is_free(&self) -> bool {
        self.offer_fee == 0
    }

    /// Rupees saved against the actual fee, if the offer is lower.
    pub fn discount(&self) -> Option<u32> {
        self.actual_fee
            .checked_sub(self.offer_fee)
            .filter(|saving| *saving > 0)
    }
}

/// A category as the listings show it, with its fee summary alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    #[serde(flatten)]
    pub category: Category,
    pub is_free: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<u32>,
}

impl From<Category> for CategoryListing {
    fn from(category: Category) -> Self {
        Self {
            is_free: category.is_free(),
            discount: category.discount(),
            category,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Editable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub actual_fee: u32,
    #[serde(default)]
    pub offer_fee: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub popup_image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CategoryDraft {
    /// Trims text fields and drops blank image links.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let description = self.description.trim().to_string();
        require_fields(&[("name", name.as_str()), ("description", description.as_str())])?;

        Ok(Self {
            name,
            description,
            image_url: blank_to_none(self.image_url),
            popup_image_url: blank_to_none(self.popup_image_url),
            ..self
        })
    }
}

/// A local administrative body used as a reference value on registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panchayath {
    pub id: PanchayathId,
    pub name: String,
    pub district: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanchayathDraft {
    pub name: String,
    pub district: String,
}

impl PanchayathDraft {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let district = self.district.trim().to_string();
        require_fields(&[("name", name.as_str()), ("district", district.as_str())])?;
        Ok(Self { name, district })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn category(actual_fee: u32, offer_fee: u32) -> Category {
        Category {
            id: CategoryId("cat-000001".to_string()),
            name: "FarmeLife".to_string(),
            description: "Agriculture and allied activities".to_string(),
            actual_fee,
            offer_fee,
            image_url: None,
            popup_image_url: None,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn discount_only_when_offer_is_lower() {
        assert_eq!(category(1000, 300).discount(), Some(700));
        assert_eq!(category(300, 300).discount(), None);
        assert_eq!(category(300, 500).discount(), None);
        assert!(category(500, 0).is_free());
    }

    #[test]
    fn draft_validation_trims_and_requires_text() {
        let draft = CategoryDraft {
            name: "  Job Card ".to_string(),
            description: " Registration card ".to_string(),
            actual_fee: 200,
            offer_fee: 0,
            image_url: Some("   ".to_string()),
            popup_image_url: Some(" https://cdn.example/job.png ".to_string()),
            is_active: true,
        }
        .validated()
        .expect("valid draft");

        assert_eq!(draft.name, "Job Card");
        assert_eq!(draft.description, "Registration card");
        assert_eq!(draft.image_url, None);
        assert_eq!(
            draft.popup_image_url.as_deref(),
            Some("https://cdn.example/job.png")
        );

        let err = PanchayathDraft {
            name: "Kadavoor".to_string(),
            district: " ".to_string(),
        }
        .validated()
        .expect_err("district required");
        assert_eq!(err, ValidationError::MissingFields(vec!["district"]));
    }
}
