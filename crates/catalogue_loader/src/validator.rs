//! Catalogue validation
//!
//! Rules:
//! - destination keys non-empty
//! - frequency finite and >= 0
//! - expression items carry `instrument` and `name` (stored-procedure
//!   addressing needs both)
//!
//! Returns the first error encountered, or Ok(()).

use contracts::{BroadcastError, Catalogue, Item, PayloadSource};
use validator::Validate;

/// Validate a merged catalogue
pub fn validate(catalogue: &Catalogue) -> Result<(), BroadcastError> {
    for entry in catalogue {
        if entry.destination.is_empty() {
            return Err(BroadcastError::catalogue_validation(
                "<destination>",
                "destination key cannot be empty",
            ));
        }
        for (idx, item) in entry.items.iter().enumerate() {
            validate_item(&entry.destination, idx, item)?;
        }
    }
    Ok(())
}

fn validate_item(destination: &str, idx: usize, item: &Item) -> Result<(), BroadcastError> {
    let field = |name: &str| format!("{destination}[{idx}].{name}");

    if !item.frequency.is_finite() {
        return Err(BroadcastError::catalogue_validation(
            field("frequency"),
            format!("frequency must be finite, got {}", item.frequency),
        ));
    }

    // Derive-level rules (frequency >= 0)
    if item.validate().is_err() {
        return Err(BroadcastError::catalogue_validation(
            field("frequency"),
            format!("frequency must be >= 0, got {}", item.frequency),
        ));
    }

    if let PayloadSource::Expression(_) = item.payload {
        if item.instrument.is_none() {
            return Err(BroadcastError::catalogue_validation(
                field("instrument"),
                "expression items must declare 'instrument'",
            ));
        }
        if item.name.is_none() {
            return Err(BroadcastError::catalogue_validation(
                field("name"),
                "expression items must declare 'name'",
            ));
        }
    }

    Ok(())
}
