//! Pure validation of capacity registrations. No I/O.
//!
//! Checks run in a fixed order and stop at the first failure:
//! name → description → technology list.

use crate::error::{CapacityError, TechnicalMessage};
use crate::model::Capacity;

pub const CAPACITY_NAME_MAX_SIZE: usize = 50;
pub const CAPACITY_DESCRIPTION_MAX_SIZE: usize = 50;
pub const CAPACITY_MIN_TECHNOLOGIES_SIZE: usize = 3;
pub const CAPACITY_MAX_TECHNOLOGIES_SIZE: usize = 20;

pub type Result<T> = std::result::Result<T, CapacityError>;

pub fn validate_capacity(capacity: &Capacity) -> Result<()> {
    validate_name(&capacity.name)?;
    validate_description(&capacity.description)?;
    validate_technologies(&capacity.technologies)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CapacityError::ParamRequiredMissing(
            TechnicalMessage::MissingRequiredParam,
        ));
    }
    if name.chars().count() > CAPACITY_NAME_MAX_SIZE {
        return Err(CapacityError::InvalidFormatParam(
            TechnicalMessage::CapacityNameTooLong,
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(CapacityError::ParamRequiredMissing(
            TechnicalMessage::MissingRequiredParam,
        ));
    }
    if description.chars().count() > CAPACITY_DESCRIPTION_MAX_SIZE {
        return Err(CapacityError::InvalidFormatParam(
            TechnicalMessage::CapacityDescriptionTooLong,
        ));
    }
    Ok(())
}

fn validate_technologies(technologies: &[i64]) -> Result<()> {
    if technologies.is_empty() {
        return Err(CapacityError::ParamRequiredMissing(
            TechnicalMessage::MissingRequiredParam,
        ));
    }
    if technologies.len() < CAPACITY_MIN_TECHNOLOGIES_SIZE {
        return Err(CapacityError::InvalidFormatParam(
            TechnicalMessage::ListTechnologiesIsTooShort,
        ));
    }
    if technologies.len() > CAPACITY_MAX_TECHNOLOGIES_SIZE {
        return Err(CapacityError::InvalidFormatParam(
            TechnicalMessage::ListTechnologiesIsTooLong,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(name: &str, description: &str, technologies: usize) -> Capacity {
        Capacity::new(name, description, (1..=technologies as i64).collect())
    }

    fn message_of(result: Result<()>) -> TechnicalMessage {
        result.unwrap_err().technical_message()
    }

    #[test]
    fn accepts_valid_capacity() {
        assert!(validate_capacity(&capacity("Backend", "Server side", 3)).is_ok());
        assert!(validate_capacity(&capacity("Backend", "Server side", 20)).is_ok());
    }

    #[test]
    fn blank_name_is_missing() {
        let err = validate_capacity(&capacity("   ", "Server side", 3)).unwrap_err();
        assert!(matches!(err, CapacityError::ParamRequiredMissing(_)));
    }

    #[test]
    fn name_longer_than_fifty_chars() {
        let name = "n".repeat(51);
        assert_eq!(
            message_of(validate_capacity(&capacity(&name, "d", 3))),
            TechnicalMessage::CapacityNameTooLong
        );
        let name = "n".repeat(50);
        assert!(validate_capacity(&capacity(&name, "d", 3)).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "ñ".repeat(50);
        assert!(validate_capacity(&capacity(&name, "d", 3)).is_ok());
    }

    #[test]
    fn blank_description_is_missing() {
        let err = validate_capacity(&capacity("Backend", "", 3)).unwrap_err();
        assert!(matches!(err, CapacityError::ParamRequiredMissing(_)));
    }

    #[test]
    fn description_too_long() {
        let description = "d".repeat(51);
        assert_eq!(
            message_of(validate_capacity(&capacity("Backend", &description, 3))),
            TechnicalMessage::CapacityDescriptionTooLong
        );
    }

    #[test]
    fn empty_technologies_is_missing() {
        let err = validate_capacity(&capacity("Backend", "Server side", 0)).unwrap_err();
        assert!(matches!(err, CapacityError::ParamRequiredMissing(_)));
    }

    #[test]
    fn technology_count_bounds() {
        for count in [1, 2] {
            assert_eq!(
                message_of(validate_capacity(&capacity("Backend", "d", count))),
                TechnicalMessage::ListTechnologiesIsTooShort
            );
        }
        for count in [21, 30] {
            assert_eq!(
                message_of(validate_capacity(&capacity("Backend", "d", count))),
                TechnicalMessage::ListTechnologiesIsTooLong
            );
        }
        for count in 3..=20 {
            assert!(validate_capacity(&capacity("Backend", "d", count)).is_ok());
        }
    }

    #[test]
    fn name_is_checked_before_technologies() {
        let name = "n".repeat(60);
        assert_eq!(
            message_of(validate_capacity(&capacity(&name, "", 0))),
            TechnicalMessage::CapacityNameTooLong
        );
    }
}
