/// Submission validation helpers
///
/// Validates lead submissions before anything is persisted, collecting every
/// violation so the caller sees all offending fields at once rather than
/// fixing them one round trip at a time.

use serde::{Deserialize, Serialize};

use super::SubmitLead;

/// One field-level validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl FieldError {
    fn required(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{field} is required"),
        }
    }
}

/// Checks required fields and email syntax, returning all violations
///
/// # Errors
///
/// Returns the full list of violations when any check fails.
pub fn validate_submission(data: &SubmitLead) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if data.first_name.trim().is_empty() {
        errors.push(FieldError::required("first_name"));
    }
    if data.last_name.trim().is_empty() {
        errors.push(FieldError::required("last_name"));
    }
    if data.company.trim().is_empty() {
        errors.push(FieldError::required("company"));
    }

    if data.email.trim().is_empty() {
        errors.push(FieldError::required("email"));
    } else if !is_valid_email(data.email.trim()) {
        errors.push(FieldError {
            field: "email".to_string(),
            message: "email is not a valid address".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Syntactic email check: one `@`, non-empty local part, domain with a dot
///
/// Matches the permissiveness of the submission form. The CRM performs its
/// own verification on approved leads.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }

    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> SubmitLead {
        SubmitLead {
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: "ana@x.com".to_string(),
            phone: None,
            company: "Acme".to_string(),
            position: None,
            description: None,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(validate_submission(&valid_submission()).is_ok());
    }

    #[test]
    fn test_empty_company_named() {
        let mut data = valid_submission();
        data.company = "  ".to_string();

        let errors = validate_submission(&data).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "company");
    }

    #[test]
    fn test_multiple_violations_reported_together() {
        let data = SubmitLead {
            first_name: String::new(),
            last_name: String::new(),
            email: "not-an-email".to_string(),
            phone: None,
            company: String::new(),
            position: None,
            description: None,
        };

        let errors = validate_submission(&data).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["first_name", "last_name", "company", "email"]);
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));

        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ana@nodot"));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("ana@x."));
        assert!(!is_valid_email("a na@x.com"));
    }
}
