//! Account operations behind the members pages and the `create-superuser`
//! command. Each runs in one transaction together with the events it raises.

use rusqlite::Connection;

use crate::auth::events::{publish, AccountEvent};
use crate::auth::forms::{
    validate_superuser, EditProfileForm, NewUser, PasswordChangeForm, SignUpForm,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{login_counter, session, users};
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::forms::{FieldErrors, NON_FIELD};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
    pub login_count: i64,
}

/// Register a regular account from the sign-up form.
pub fn register(conn: &mut Connection, form: &SignUpForm, bcrypt_cost: u32) -> AppResult<User> {
    let new_user = form.clean()?;
    create_account(conn, &new_user, false, bcrypt_cost)
}

/// Create an admin account, as done by the `create-superuser` command.
pub fn create_superuser(
    conn: &mut Connection,
    username: &str,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let new_user = validate_superuser(username, email, password)?;
    create_account(conn, &new_user, true, bcrypt_cost)
}

fn create_account(
    conn: &mut Connection,
    new_user: &NewUser,
    is_admin: bool,
    bcrypt_cost: u32,
) -> AppResult<User> {
    let password_hash = hash_password(&new_user.password, bcrypt_cost)?;

    let tx = conn.transaction()?;
    if users::username_taken(&tx, &new_user.profile.username, None)? {
        let mut errors = FieldErrors::default();
        errors.add("username", USERNAME_TAKEN);
        return Err(AppError::Validation(errors));
    }

    let user = users::insert(&tx, &new_user.profile, &password_hash, is_admin)?;
    publish(
        &tx,
        &AccountEvent::UserCreated {
            user_id: user.id.clone(),
        },
    )?;
    tx.commit()?;

    tracing::info!(username = %user.username, is_admin, "user registered");
    Ok(user)
}

/// Check credentials and open a session. Bad credentials surface as a
/// form-level validation error and leave the login counter untouched.
pub fn sign_in(
    conn: &mut Connection,
    username: &str,
    password: &str,
    session_hours: u64,
) -> AppResult<SignedIn> {
    let user = users::find_by_username(conn, username.trim())?
        .filter(|user| verify_password(password, &user.password_hash))
        .ok_or_else(|| {
            let mut errors = FieldErrors::default();
            errors.add(
                NON_FIELD,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            AppError::Validation(errors)
        })?;

    let tx = conn.transaction()?;
    let token = session::create_session(&tx, &user.id, session_hours)?;
    publish(
        &tx,
        &AccountEvent::LoginSucceeded {
            user_id: user.id.clone(),
        },
    )?;
    let login_count = login_counter::get(&tx, &user.id)?
        .map(|counter| counter.login_count)
        .unwrap_or_default();
    tx.commit()?;

    Ok(SignedIn {
        user,
        token,
        login_count,
    })
}

pub fn sign_out(conn: &Connection, token: &str) -> AppResult<()> {
    session::delete_session(conn, token)?;
    Ok(())
}

pub fn update_profile(conn: &mut Connection, user_id: &str, form: &EditProfileForm) -> AppResult<User> {
    let profile = form.clean()?;

    let tx = conn.transaction()?;
    if users::username_taken(&tx, &profile.username, Some(user_id))? {
        let mut errors = FieldErrors::default();
        errors.add("username", USERNAME_TAKEN);
        return Err(AppError::Validation(errors));
    }
    if users::update_profile(&tx, user_id, &profile)? == 0 {
        return Err(AppError::NotFound);
    }
    let user = users::find_by_id(&tx, user_id)?.ok_or(AppError::NotFound)?;
    tx.commit()?;

    tracing::info!(username = %user.username, "profile updated");
    Ok(user)
}

/// Set a new password and end every session of the user other than
/// `keep_token`.
pub fn change_password(
    conn: &mut Connection,
    user: &User,
    form: &PasswordChangeForm,
    keep_token: Option<&str>,
    bcrypt_cost: u32,
) -> AppResult<()> {
    let mut errors = match form.clean(&user.username) {
        Ok(_) => FieldErrors::default(),
        Err(errors) => errors,
    };
    if !form.old_password.is_empty() && !verify_password(&form.old_password, &user.password_hash) {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    let new_password = errors.into_result(form.new_password1.as_str())?;

    let password_hash = hash_password(new_password, bcrypt_cost)?;
    let tx = conn.transaction()?;
    users::set_password_hash(&tx, &user.id, &password_hash)?;
    let ended = session::delete_other_sessions(&tx, &user.id, keep_token)?;
    tx.commit()?;

    tracing::info!(username = %user.username, ended, "password changed");
    Ok(())
}
