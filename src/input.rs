//! Field checks shared by the operations.
//!
//! Each check maps to one error constructor so that every operation reports
//! its own code for the first field that fails. Lengths are counted in
//! characters after trimming surrounding whitespace.

use crate::error::ServiceError;
use crate::models::Grade;

pub(crate) fn min_chars(
    value: &str,
    min: usize,
    field: &str,
    err: fn(String) -> ServiceError,
) -> Result<(), ServiceError> {
    if value.trim().chars().count() < min {
        return Err(err(format!(
            "{} must be at least {} characters long",
            field, min
        )));
    }
    Ok(())
}

pub(crate) fn grade(value: Option<i64>) -> Result<Grade, ServiceError> {
    match value {
        Some(v) => Grade::new(v).ok_or_else(|| {
            ServiceError::InvalidGrade(format!(
                "grade must be between {} and {}, got {}",
                Grade::MIN,
                Grade::MAX,
                v
            ))
        }),
        None => Err(ServiceError::InvalidGrade("grade is required".to_string())),
    }
}

pub(crate) fn subject(value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidSubject(
            "subject must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        assert!(min_chars("¿Qé", 3, "query", ServiceError::InvalidQuery).is_ok());
        assert!(min_chars("  ab  ", 3, "query", ServiceError::InvalidQuery).is_err());
    }

    #[test]
    fn test_grade_missing_and_out_of_range() {
        assert_eq!(grade(None).unwrap_err().code(), "INVALID_GRADE");
        assert_eq!(grade(Some(13)).unwrap_err().code(), "INVALID_GRADE");
        assert_eq!(grade(Some(7)).unwrap().value(), 7);
    }

    #[test]
    fn test_subject_blank() {
        assert_eq!(subject("   ").unwrap_err().code(), "INVALID_SUBJECT");
        assert!(subject("Historia").is_ok());
    }
}
