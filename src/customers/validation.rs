//! Venezuelan identification format validation: a letter (`V`/`E`)
//! followed by 7-8 digits.

use crate::error::{CoreError, CoreResult};

/// Normalizes (uppercase, no spaces) and validates a `V-12345678` /
/// `E-12345678` style identification. Returns the normalized form.
pub fn validate_identification(raw: &str) -> CoreResult<String> {
    let normalized: String = raw.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();

    let mut chars = normalized.chars();
    let letter = chars.next();
    let separator = chars.next();
    let digits: String = chars.collect();

    let letter_ok = matches!(letter, Some('V') | Some('E'));
    let separator_ok = separator == Some('-');
    let digits_ok = digits.len() >= 7 && digits.len() <= 8 && digits.chars().all(|c| c.is_ascii_digit());

    if !letter_ok || !separator_ok || !digits_ok {
        return Err(CoreError::validation(
            "identification must be in format V-12345678 or E-12345678",
        ));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_cedula() {
        assert_eq!(validate_identification("v-12345678").unwrap(), "V-12345678");
        assert_eq!(validate_identification(" E-1234567 ").unwrap(), "E-1234567");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(validate_identification("V12345678").is_err());
    }

    #[test]
    fn rejects_short_digit_run() {
        assert!(validate_identification("V-123456").is_err());
    }

    #[test]
    fn rejects_unknown_letter() {
        assert!(validate_identification("X-1234567").is_err());
    }
}
