//! Customer id derivation and status-check token resolution.

use super::domain::{CustomerId, MobileNumber};
use crate::validation::{require_fields, ValidationError};

/// Programme tag every customer id starts with.
pub const CUSTOMER_ID_PREFIX: &str = "ESEP";

/// `ESEP` + mobile number + upper-cased first character of the name.
///
/// Pure and deterministic. It does not guarantee uniqueness on its own; the mobile
/// number index in the store does.
pub fn derive_customer_id(mobile_number: &MobileNumber, name: &str) -> CustomerId {
    let initial: String = name
        .trim_start()
        .chars()
        .next()
        .map(|first| first.to_uppercase().collect())
        .unwrap_or_default();
    CustomerId(format!(
        "{CUSTOMER_ID_PREFIX}{}{initial}",
        mobile_number.as_str()
    ))
}

/// How a public status-check token is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    Mobile(MobileNumber),
    Customer(CustomerId),
}

impl StatusLookup {
    /// Ten digits search by mobile number, anything else by upper-cased customer id.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let token = token.trim();
        require_fields(&[("search", token)])?;

        match MobileNumber::parse(token) {
            Ok(mobile) => Ok(Self::Mobile(mobile)),
            Err(_) => Ok(Self::Customer(CustomerId::normalized(token))),
        }
    }
}
