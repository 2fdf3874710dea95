//! Custom validation rules used by request payloads.

use validator::ValidationError;

/// Accepts `#RRGGBB` colors (case-insensitive hex digits).
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("must be a #RRGGBB hex color".into());
        Err(err)
    }
}
