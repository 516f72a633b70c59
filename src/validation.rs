//! Field validation shared by the account-like entities (users and hosts)
//! and the required-field checks every create operation performs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&#";
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// International (E.164-like) or local phone number.
pub static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone regex is valid"));

static HTTP_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url regex is valid"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("Password may only contain letters, digits and the characters @$!%*?&#")]
    InvalidCharacter,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one number")]
    MissingNumber,

    #[error("Password must contain at least one special character (@$!%*?&#)")]
    MissingSpecialChar,
}

/// Password strength rule applied to users and hosts.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordPolicy {
    /// At least eight characters.
    Basic,
    /// At least eight characters mixing case, digits and a special character.
    #[default]
    Strict,
}

impl PasswordPolicy {
    /// Validate a password against the policy
    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        if *self == PasswordPolicy::Basic {
            return Ok(());
        }

        let is_special = |c: char| PASSWORD_SPECIALS.contains(c);
        if !password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || is_special(c))
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PasswordPolicyError::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PasswordPolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingNumber);
        }
        if !password.chars().any(is_special) {
            return Err(PasswordPolicyError::MissingSpecialChar);
        }

        Ok(())
    }
}

/// Payloads that carry account credentials and a profile picture.
///
/// Static field rules (lengths, email, phone) come from the payload's own
/// `Validate` derive; the rules below depend on runtime configuration.
pub trait AccountInput: Validate {
    fn password(&self) -> Option<&str>;
    fn profile_picture(&self) -> Option<&str>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub password: PasswordPolicy,
    pub require_profile_picture: bool,
}

impl ValidationPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            password: config.password_policy,
            require_profile_picture: config.require_profile_picture,
        }
    }

    /// Runs every field rule for a user or host payload and reports all
    /// violations at once. `creating` controls whether a required profile
    /// picture may be absent (it may on partial updates).
    pub fn validate_account<T: AccountInput>(
        &self,
        input: &T,
        creating: bool,
    ) -> Result<(), ServiceError> {
        let mut errors = match input.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(password) = input.password() {
            if let Err(err) = self.password.validate(password) {
                errors.add("password", field_error("password", err.to_string()));
            }
        }

        if let Err(message) = self.check_profile_picture(input.profile_picture(), creating) {
            errors.add("profile_picture", field_error("profile_picture", message));
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    fn check_profile_picture(&self, value: Option<&str>, creating: bool) -> Result<(), String> {
        let Some(url) = value else {
            return if self.require_profile_picture && creating {
                Err("Profile picture is required".to_string())
            } else {
                Ok(())
            };
        };

        if !HTTP_URL_RE.is_match(url) {
            return Err("Profile picture must be a valid http(s) URL".to_string());
        }

        if self.require_profile_picture {
            let lower = url.to_ascii_lowercase();
            if !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                return Err(
                    "Profile picture must point to a .jpg, .jpeg, .png, .gif or .webp image"
                        .to_string(),
                );
            }
        }

        Ok(())
    }
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// A string field counts as supplied only when it has non-blank content.
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Fails with "Missing required fields: ..." naming every absent field,
/// in the order given.
pub fn require_fields(fields: &[(&str, bool)]) -> Result<(), ServiceError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::missing_fields(missing))
    }
}

/// Partial updates must change at least one allow-listed field.
pub fn ensure_patch_not_empty(has_changes: bool) -> Result<(), ServiceError> {
    if has_changes {
        Ok(())
    } else {
        Err(ServiceError::bad_request("No valid fields provided for update."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[derive(Validate)]
    struct Account {
        #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
        username: Option<String>,
        password: Option<String>,
        profile_picture: Option<String>,
    }

    impl AccountInput for Account {
        fn password(&self) -> Option<&str> {
            self.password.as_deref()
        }
        fn profile_picture(&self) -> Option<&str> {
            self.profile_picture.as_deref()
        }
    }

    fn account(password: &str, picture: Option<&str>) -> Account {
        Account {
            username: Some("guest".into()),
            password: Some(password.into()),
            profile_picture: picture.map(str::to_string),
        }
    }

    #[rstest]
    #[case("Str0ng!pw", Ok(()))]
    #[case("Sh0rt!", Err(PasswordPolicyError::TooShort { min_length: 8 }))]
    #[case("alllower1!", Err(PasswordPolicyError::MissingUppercase))]
    #[case("ALLUPPER1!", Err(PasswordPolicyError::MissingLowercase))]
    #[case("NoDigits!!", Err(PasswordPolicyError::MissingNumber))]
    #[case("NoSpecial12", Err(PasswordPolicyError::MissingSpecialChar))]
    #[case("Bad space1!", Err(PasswordPolicyError::InvalidCharacter))]
    fn strict_password_rules(
        #[case] password: &str,
        #[case] expected: Result<(), PasswordPolicyError>,
    ) {
        assert_eq!(PasswordPolicy::Strict.validate(password), expected);
    }

    #[rstest]
    #[case("password", true)]
    #[case("1234567", false)]
    #[case("with space ok", true)]
    fn basic_password_only_checks_length(#[case] password: &str, #[case] ok: bool) {
        assert_eq!(PasswordPolicy::Basic.validate(password).is_ok(), ok);
    }

    #[rstest]
    #[case("+14155552671", true)]
    #[case("5551234", true)]
    #[case("0123456", false)]
    #[case("+1 415 555", false)]
    #[case("phone", false)]
    fn phone_pattern(#[case] phone: &str, #[case] ok: bool) {
        assert_eq!(PHONE_RE.is_match(phone), ok);
    }

    #[test]
    fn profile_picture_must_be_http_url() {
        let policy = ValidationPolicy::default();
        assert!(policy
            .validate_account(&account("Str0ng!pw", Some("ftp://x/y.png")), true)
            .is_err());
        assert!(policy
            .validate_account(&account("Str0ng!pw", Some("https://cdn.example/a")), true)
            .is_ok());
        assert!(policy.validate_account(&account("Str0ng!pw", None), true).is_ok());
    }

    #[test]
    fn required_profile_picture_needs_image_extension() {
        let policy = ValidationPolicy {
            require_profile_picture: true,
            ..Default::default()
        };
        assert!(policy.validate_account(&account("Str0ng!pw", None), true).is_err());
        assert!(policy.validate_account(&account("Str0ng!pw", None), false).is_ok());
        assert!(policy
            .validate_account(&account("Str0ng!pw", Some("https://cdn.example/me")), true)
            .is_err());
        assert!(policy
            .validate_account(&account("Str0ng!pw", Some("https://cdn.example/me.JPG")), true)
            .is_ok());
    }

    #[test]
    fn account_errors_name_every_field() {
        let input = Account {
            username: Some("ab".into()),
            password: Some("weak".into()),
            profile_picture: None,
        };
        let err = ValidationPolicy::default()
            .validate_account(&input, true)
            .unwrap_err();
        assert_matches!(err, ServiceError::Validation { .. });
        assert_eq!(err.fields(), ["password".to_string(), "username".to_string()]);
    }

    #[test]
    fn require_fields_reports_missing_in_order() {
        let err = require_fields(&[("userId", false), ("propertyId", true), ("totalPrice", false)])
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: userId, totalPrice");
        assert!(require_fields(&[("name", true)]).is_ok());
    }

    #[test]
    fn blank_strings_are_not_text() {
        assert!(!has_text(&Some("   ".into())));
        assert!(!has_text(&None));
        assert!(has_text(&Some("Wifi".into())));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = ensure_patch_not_empty(false).unwrap_err();
        assert_eq!(err.to_string(), "No valid fields provided for update.");
    }
}
