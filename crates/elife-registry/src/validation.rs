/// Input rejected before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("mobile number must be exactly 10 digits")]
    InvalidMobileNumber,
    #[error("unknown registration status '{0}'")]
    InvalidStatus(String),
}

/// Fails with every blank field named, in the order given.
pub fn require_fields(fields: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}
