//! Field validators shared by service inputs.

use validator::ValidationError;

/// Reject empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("This field may not be blank.".into()))
    } else {
        Ok(())
    }
}
