//! Shared request validation rules.

use std::borrow::Cow;
use validator::ValidationError;

pub const MAX_TITLE_LEN: u64 = 254;
pub const MAX_DESCRIPTION_LEN: u64 = 2048;

/// Reject strings that are empty or whitespace only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("must not be blank".into());
        error.add_param(Cow::from("value"), &value);
        return Err(error);
    }
    Ok(())
}
