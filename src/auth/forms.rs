use serde::Deserialize;
use validator::Validate;

use crate::auth::users::Profile;
use crate::forms::{collect, FieldErrors, REQUIRED};

const PASSWORD_MIN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignUpForm {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1), email)]
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EditProfileForm {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1), email)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordChangeForm {
    #[validate(length(min = 1))]
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Fields of an admin created from the command line; names are optional.
#[derive(Debug, Validate)]
struct SuperuserFields {
    #[validate(length(min = 1, max = 150))]
    username: String,
    #[validate(length(min = 1), email)]
    email: String,
}

/// A registration that passed field validation; the password is still
/// plaintext at this point.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub profile: Profile,
    pub password: String,
}

impl SignUpForm {
    pub fn clean(&self) -> Result<NewUser, FieldErrors> {
        let form = SignUpForm {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password1: self.password1.clone(),
            password2: self.password2.clone(),
        };
        let mut errors = collect(form.validate());
        check_username_chars(&mut errors, &form.username);
        check_new_password(
            &mut errors,
            "password2",
            &form.password1,
            &form.password2,
            &form.username,
        );

        errors.into_result(NewUser {
            profile: Profile {
                username: form.username,
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
            },
            password: form.password1,
        })
    }
}

impl EditProfileForm {
    pub fn clean(&self) -> Result<Profile, FieldErrors> {
        let form = EditProfileForm {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
        };
        let mut errors = collect(form.validate());
        check_username_chars(&mut errors, &form.username);

        errors.into_result(Profile {
            username: form.username,
            email: form.email,
            first_name: form.first_name,
            last_name: form.last_name,
        })
    }
}

impl PasswordChangeForm {
    /// Checks the new password pair. The old password is verified against
    /// the stored hash by the caller.
    pub fn clean(&self, username: &str) -> Result<String, FieldErrors> {
        let mut errors = collect(self.validate());
        check_new_password(
            &mut errors,
            "new_password2",
            &self.new_password1,
            &self.new_password2,
            username,
        );
        errors.into_result(self.new_password1.clone())
    }
}

pub fn validate_superuser(username: &str, email: &str, password: &str) -> Result<NewUser, FieldErrors> {
    let fields = SuperuserFields {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
    };
    let mut errors = collect(fields.validate());
    check_username_chars(&mut errors, &fields.username);
    check_new_password(&mut errors, "password", password, password, &fields.username);

    errors.into_result(NewUser {
        profile: Profile {
            username: fields.username,
            email: fields.email,
            first_name: String::new(),
            last_name: String::new(),
        },
        password: password.to_string(),
    })
}

fn check_username_chars(errors: &mut FieldErrors, username: &str) {
    if !username.is_empty() && !username.chars().all(is_username_char) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_new_password(
    errors: &mut FieldErrors,
    confirm_field: &str,
    password: &str,
    confirmation: &str,
    username: &str,
) {
    if password.is_empty() || confirmation.is_empty() {
        errors.add(confirm_field, REQUIRED);
        return;
    }
    if password != confirmation {
        errors.add(confirm_field, "The two password fields didn't match.");
        return;
    }
    if password.chars().count() < PASSWORD_MIN {
        errors.add(
            confirm_field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN
            ),
        );
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(confirm_field, "This password is entirely numeric.");
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        errors.add(confirm_field, "The password is too similar to the username.");
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}
