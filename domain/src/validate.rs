//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::CoreError;
use crate::NewItem;

/// Validate an item name: present and within a sane length.
pub fn validate_name(s: &str) -> Result<(), CoreError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidName("empty".into()));
    }
    if trimmed.len() > 256 {
        return Err(CoreError::InvalidName("too long".into()));
    }
    Ok(())
}

/// Validate a price: a finite, strictly positive number.
pub fn validate_price(p: f64) -> Result<(), CoreError> {
    if !p.is_finite() {
        return Err(CoreError::InvalidPrice("not a finite number".into()));
    }
    if p <= 0.0 {
        return Err(CoreError::InvalidPrice("must be positive".into()));
    }
    Ok(())
}

/// Presence checks over a creation/update input. Anything stronger is out of
/// scope for this service.
pub fn validate_new_item(input: &NewItem) -> Result<(), CoreError> {
    validate_name(&input.name)?;
    validate_price(input.price)
}
