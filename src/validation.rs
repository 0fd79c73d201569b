//! Field helpers shared by the request handlers.

use bson::oid::ObjectId;

use crate::error::AppError;

/// Trim a submitted value; blank strings count as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record a length-cap violation for `label` when `value` is longer than `max` characters.
pub fn check_max_len(errors: &mut Vec<String>, label: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(format!("{label} cannot exceed {max} characters"));
    }
}

/// Turn collected validator messages into a result.
pub fn finish(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Parse a hex ObjectId from a path segment; `entity` names the resource in the error.
pub fn parse_object_id(id: &str, entity: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {entity} ID")))
}
