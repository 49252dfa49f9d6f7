use crate::utils::error::{Result, ZitatError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_at_least(field_name: &str, value: i64, min_value: i64) -> Result<()> {
    if value < min_value {
        return Err(ZitatError::ConfigError {
            message: format!(
                "{}: value {} must be at least {}",
                field_name, value, min_value
            ),
        });
    }
    Ok(())
}
