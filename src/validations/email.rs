use email_address::EmailAddress;
use rayon::prelude::*;
use validator::ValidationError;

use crate::utils::{locale_utils::Messages, validation_utils::add_error};

const MIN_EMAIL_LENGTH: usize = 5;
const MAX_EMAIL_LENGTH: usize = 254;

fn has_min_length(email: &str, messages: &Messages) -> Result<(), String> {
    if email.len() < MIN_EMAIL_LENGTH {
        return Err(messages.get_validation_message(
            "email.too_short",
            &format!("Email must be at least {} characters", MIN_EMAIL_LENGTH),
        ));
    }
    Ok(())
}

fn has_max_length(email: &str, messages: &Messages) -> Result<(), String> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(messages.get_validation_message(
            "email.too_long",
            &format!("Email must be less than {} characters", MAX_EMAIL_LENGTH),
        ));
    }
    Ok(())
}

fn has_at_and_dot(email: &str, messages: &Messages) -> Result<(), String> {
    if !email.contains('@') || !email.contains('.') {
        Err(messages
            .get_validation_message("email.missing_at", "Email must contain '@' and '.'"))
    } else {
        Ok(())
    }
}

fn has_no_invalid_chars(email: &str, messages: &Messages) -> Result<(), String> {
    if email.chars().any(|c| c == ' ' || !c.is_ascii()) {
        Err(messages.get_validation_message(
            "email.invalid_chars",
            "Email must not contain spaces or non-ASCII characters",
        ))
    } else {
        Ok(())
    }
}

fn has_no_consecutive_dots(email: &str, messages: &Messages) -> Result<(), String> {
    if email.contains("..") {
        Err(messages.get_validation_message(
            "email.consecutive_dots",
            "Email must not contain consecutive dots",
        ))
    } else {
        Ok(())
    }
}

fn domain_exists(email: &str, messages: &Messages) -> Result<(), String> {
    if email.split('@').nth(1).is_none() {
        Err(messages.get_validation_message(
            "email.missing_domain",
            "Email must have a domain part after '@'",
        ))
    } else {
        Ok(())
    }
}

fn is_overall_format_valid(email: &str, messages: &Messages) -> Result<(), String> {
    if !EmailAddress::is_valid(email) {
        Err(messages.get_validation_message("email.invalid", "Invalid email format"))
    } else {
        Ok(())
    }
}

pub fn validate_email(email: &str, messages: &Messages) -> Result<(), ValidationError> {
    let validations = vec![
        has_min_length,
        has_max_length,
        has_at_and_dot,
        has_no_invalid_chars,
        has_no_consecutive_dots,
        domain_exists,
    ];

    let mut errors: Vec<String> = validations
        .par_iter()
        .filter_map(|validate| validate(email, messages).err())
        .collect();

    if errors.is_empty() {
        if let Err(msg) = is_overall_format_valid(email, messages) {
            errors.push(msg);
        }
    }

    if !errors.is_empty() {
        let concatenated_errors = errors.join(", ");
        return Err(add_error("invalid_email", concatenated_errors, email));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::locale_utils::Lang;

    fn messages() -> Messages {
        Messages::new(Lang::En)
    }

    #[test]
    fn accepts_plain_addresses() {
        validate_email("new-user-email@foo.bar", &messages()).unwrap();
        validate_email("a.b@c.de", &messages()).unwrap();
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_email("not_valid_email", &messages()).is_err());
        assert!(validate_email("", &messages()).is_err());
        assert!(validate_email("two words@foo.bar", &messages()).is_err());
        assert!(validate_email("double..dot@foo.bar", &messages()).is_err());
    }

    #[test]
    fn rejection_carries_the_invalid_email_code() {
        let err = validate_email("not_valid_email", &messages()).unwrap_err();
        assert_eq!(err.code, "invalid_email");
    }
}
