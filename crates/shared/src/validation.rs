//! Admissibility checks for waitlist input.
//!
//! Everything here is pure: the same input always yields the same verdict,
//! and nothing touches the network or the store.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::{domain::Role, protocol::SubmitSignupRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email and organization are required fields")]
    MissingRequiredFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Signup input that passed validation, trimmed and with a normalised email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub organization: String,
}

/// Return true if `email` has the `local@domain.tld` shape.
///
/// Surrounding whitespace is ignored and letters match in either case.
pub fn is_valid_email(email: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid regex")
    });
    RE.is_match(email.trim())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_signup(request: &SubmitSignupRequest) -> Result<NewSignup, ValidationError> {
    let email = request.email.trim();
    let organization = request.organization.trim();
    if email.is_empty() || organization.is_empty() {
        return Err(ValidationError::MissingRequiredFields);
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(NewSignup {
        email: normalize_email(email),
        name,
        role: request.role,
        organization: organization.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LOCAL: &str = "[a-z0-9._%+-]{1,16}";
    const DOMAIN: &str = "[a-z0-9-]{1,12}(\\.[a-z0-9-]{1,8}){0,2}";

    fn with_random_case(email: &str, upper: &[bool]) -> String {
        email
            .chars()
            .zip(upper.iter().cycle())
            .map(|(ch, &up)| if up { ch.to_ascii_uppercase() } else { ch })
            .collect()
    }

    fn well_formed() -> impl Strategy<Value = String> {
        proptest::string::string_regex(&format!("{LOCAL}@{DOMAIN}\\.[a-z]{{2,6}}")).unwrap()
    }

    fn short_tld() -> impl Strategy<Value = String> {
        proptest::string::string_regex(&format!("{LOCAL}@{DOMAIN}\\.[a-z]")).unwrap()
    }

    fn tld_with_digit() -> impl Strategy<Value = String> {
        proptest::string::string_regex(&format!("{LOCAL}@{DOMAIN}\\.[a-z]{{0,3}}[0-9][a-z0-9]{{0,3}}")).unwrap()
    }

    proptest! {
        #[test]
        fn generated_well_formed_addresses_are_accepted(
            email in well_formed(),
            upper in prop::collection::vec(any::<bool>(), 1..32),
        ) {
            let email = with_random_case(&email, &upper);
            prop_assert!(is_valid_email(&email), "expected {:?} to be accepted", email);
        }

        #[test]
        fn generated_addresses_without_at_are_rejected(email in "[a-zA-Z0-9._%+-]{0,32}") {
            prop_assert!(!is_valid_email(&email), "expected {:?} to be rejected", email);
        }

        #[test]
        fn generated_single_letter_tlds_are_rejected(email in short_tld()) {
            prop_assert!(!is_valid_email(&email), "expected {:?} to be rejected", email);
        }

        #[test]
        fn generated_tlds_with_digits_are_rejected(email in tld_with_digit()) {
            prop_assert!(!is_valid_email(&email), "expected {:?} to be rejected", email);
        }
    }

    fn request(email: &str, organization: &str) -> SubmitSignupRequest {
        SubmitSignupRequest {
            email: email.to_string(),
            name: None,
            role: Role::Student,
            organization: organization.to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_addresses() {
        let corpus = [
            "a@uni.ac.uk",
            "Jane.Doe@Example.COM",
            "first+tag@sub.domain.org",
            "under_score%x@host-name.io",
            "  padded@example.com  ",
            "x1@y2.dev",
        ];
        for email in corpus {
            assert!(is_valid_email(email), "expected {email:?} to be accepted");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        let corpus = [
            "",
            "   ",
            "plainaddress",
            "@example.com",
            "missing-at.example.com",
            "user@",
            "user@domain",
            "user@domain.c",
            "user@@domain.com",
            "user name@domain.com",
            "user@domain.com.",
            "user@.com",
            "user@domain.c0m",
        ];
        for email in corpus {
            assert!(!is_valid_email(email), "expected {email:?} to be rejected");
        }
    }

    #[test]
    fn blank_organization_is_rejected_before_email_shape() {
        let err = validate_signup(&request("not-an-email", "   ")).expect_err("blank org");
        assert_eq!(err, ValidationError::MissingRequiredFields);
        assert_eq!(err.to_string(), "Email and organization are required fields");
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = validate_signup(&request("nobody", "Acme")).expect_err("bad email");
        assert_eq!(err, ValidationError::InvalidEmail);
    }

    #[test]
    fn valid_input_is_trimmed_and_normalised() {
        let mut input = request("  A@Uni.AC.uk ", "  University of Bath ");
        input.name = Some("   ".to_string());
        input.role = Role::University;

        let signup = validate_signup(&input).expect("valid");
        assert_eq!(signup.email, "a@uni.ac.uk");
        assert_eq!(signup.organization, "University of Bath");
        assert_eq!(signup.name, None);
        assert_eq!(signup.role, Role::University);
    }
}
