//! Registration and password-change schemas.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FieldErrors, ValidationError, REQUIRED};

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_PERSON_NAME_LEN: usize = 150;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("static regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));

#[derive(Debug, Clone, Default)]
pub struct RegisterUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterUser {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let mut errors = FieldErrors::new();

        let email = present(&mut errors, "email", self.email).and_then(|e| {
            let e = e.trim().to_string();
            if e.chars().count() > MAX_EMAIL_LEN {
                errors.add("email", too_long(MAX_EMAIL_LEN));
                None
            } else if !is_valid_email(&e) {
                errors.add("email", "Enter a valid email address.");
                None
            } else {
                Some(e)
            }
        });

        let username = present(&mut errors, "username", self.username).and_then(|u| {
            if u.chars().count() > MAX_USERNAME_LEN {
                errors.add("username", too_long(MAX_USERNAME_LEN));
                None
            } else if !is_valid_username(&u) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
                None
            } else {
                Some(u)
            }
        });

        let first_name = present(&mut errors, "first_name", self.first_name)
            .and_then(|n| person_name(&mut errors, "first_name", n));
        let last_name = present(&mut errors, "last_name", self.last_name)
            .and_then(|n| person_name(&mut errors, "last_name", n));
        let password = present(&mut errors, "password", self.password);

        match (email, username, first_name, last_name, password) {
            (Some(email), Some(username), Some(first_name), Some(last_name), Some(password)) => {
                errors.finish(NewUser {
                    email,
                    username,
                    first_name,
                    last_name,
                    password,
                })
            }
            _ => Err(ValidationError(errors)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetPassword {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub new_password: String,
    pub current_password: String,
}

impl SetPassword {
    pub fn validate(self) -> Result<PasswordChange, ValidationError> {
        let mut errors = FieldErrors::new();
        let new_password = present(&mut errors, "new_password", self.new_password);
        let current_password = present(&mut errors, "current_password", self.current_password);
        match (new_password, current_password) {
            (Some(new_password), Some(current_password)) => errors.finish(PasswordChange {
                new_password,
                current_password,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// A required string that may not be blank.
fn present(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, "This field may not be blank.");
            None
        }
        Some(v) => Some(v),
    }
}

fn person_name(errors: &mut FieldErrors, field: &str, name: String) -> Option<String> {
    let name = name.trim().to_string();
    if name.chars().count() > MAX_PERSON_NAME_LEN {
        errors.add(field, too_long(MAX_PERSON_NAME_LEN));
        return None;
    }
    Some(name)
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterUser {
        RegisterUser {
            email: Some("cook@example.com".to_string()),
            username: Some("cook".to_string()),
            first_name: Some("Ann".to_string()),
            last_name: Some("Smith".to_string()),
            password: Some("s3cret-pass".to_string()),
        }
    }

    #[test]
    fn test_valid_registration() {
        let user = valid().validate().unwrap();
        assert_eq!(user.username, "cook");
        assert_eq!(user.email, "cook@example.com");
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let err = RegisterUser::default().validate().unwrap_err();
        for field in ["email", "username", "first_name", "last_name", "password"] {
            assert_eq!(
                err.fields().get(field),
                Some(&[REQUIRED.to_string()][..]),
                "{field}"
            );
        }
    }

    #[test]
    fn test_blank_names_rejected() {
        let err = RegisterUser {
            first_name: Some("  ".to_string()),
            ..valid()
        }
        .validate()
        .unwrap_err();
        assert!(err.fields().contains("first_name"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn test_username_characters() {
        assert!(is_valid_username("chef.anna+1@home-made_"));
        assert!(!is_valid_username("chef anna"));
        assert!(!is_valid_username("chef!"));
    }

    #[test]
    fn test_set_password_requires_both() {
        let err = SetPassword {
            new_password: Some("x".to_string()),
            current_password: None,
        }
        .validate()
        .unwrap_err();
        assert!(err.fields().contains("current_password"));
        assert!(!err.fields().contains("new_password"));
    }
}
