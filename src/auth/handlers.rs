use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::accounts;
use crate::auth::forms::{EditProfileForm, LoginForm, PasswordChangeForm, SignUpForm};
use crate::auth::{login_counter, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{session_token, CurrentUser, MaybeUser};
use crate::forms::FieldErrors;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "registration/register.html")]
pub struct RegisterTemplate {
    pub username: Option<String>,
    pub form: SignUpForm,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    pub username: Option<String>,
    pub form: LoginForm,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "registration/edit_profile.html")]
pub struct EditProfileTemplate {
    pub username: Option<String>,
    pub form: EditProfileForm,
    pub login_count: i64,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "registration/change_password.html")]
pub struct ChangePasswordTemplate {
    pub username: Option<String>,
    pub errors: FieldErrors,
}

// -- Cookie helpers --

fn session_cookie(cookie_name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        cookie_name, token, max_age_secs
    )
}

fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", cookie_name)
}

/// Re-render a form with its field errors; anything else propagates.
fn rejected<T: Template>(page: T) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response()
}

// -- Registration --

/// GET /members/register/
pub async fn register_page(MaybeUser(user): MaybeUser) -> Html<RegisterTemplate> {
    Html(RegisterTemplate {
        username: user.map(|u| u.username),
        form: SignUpForm::default(),
        errors: FieldErrors::default(),
    })
}

/// POST /members/register/: create the account, then send the user to log in.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> AppResult<Response> {
    let result = {
        let mut conn = state.db.get()?;
        accounts::register(&mut conn, &form, state.config.auth.bcrypt_cost)
    };

    match result {
        Ok(_) => Ok(Redirect::to("/members/login/").into_response()),
        Err(AppError::Validation(errors)) => Ok(rejected(RegisterTemplate {
            username: None,
            form: SignUpForm {
                password1: String::new(),
                password2: String::new(),
                ..form
            },
            errors,
        })),
        Err(e) => Err(e),
    }
}

// -- Login / logout --

/// GET /members/login/
pub async fn login_page(MaybeUser(user): MaybeUser) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        username: user.map(|u| u.username),
        form: LoginForm::default(),
        errors: FieldErrors::default(),
    })
}

/// POST /members/login/: verify credentials, count the login, set the cookie.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let result = {
        let mut conn = state.db.get()?;
        accounts::sign_in(
            &mut conn,
            &form.username,
            &form.password,
            state.config.auth.session_hours,
        )
    };

    match result {
        Ok(signed_in) => {
            tracing::info!(
                username = %signed_in.user.username,
                login_count = signed_in.login_count,
                "user logged in"
            );
            let cookie = session_cookie(
                &state.config.auth.cookie_name,
                &signed_in.token,
                state.config.auth.session_hours,
            );
            Ok((
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, "/".to_string()),
                    (header::SET_COOKIE, cookie),
                ],
                "",
            )
                .into_response())
        }
        Err(AppError::Validation(errors)) => Ok(rejected(LoginTemplate {
            username: None,
            form: LoginForm {
                password: String::new(),
                ..form
            },
            errors,
        })),
        Err(e) => Err(e),
    }
}

/// POST /members/logout/: delete session and redirect
pub async fn logout(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
) -> AppResult<Response> {
    let (parts, _body) = request.into_parts();
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = session_token(&parts.headers, cookie_name) {
        let conn = state.db.get()?;
        accounts::sign_out(&conn, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(cookie_name)),
        ],
        "",
    )
        .into_response())
}

// -- Profile --

/// GET /members/edit_profile/
pub async fn edit_profile_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<EditProfileTemplate>> {
    let conn = state.db.get()?;
    let account = users::find_by_id(&conn, &user.id)?.ok_or(AppError::NotFound)?;
    let login_count = login_count(&conn, &user.id)?;

    Ok(Html(EditProfileTemplate {
        username: Some(account.username.clone()),
        form: EditProfileForm {
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
        },
        login_count,
        errors: FieldErrors::default(),
    }))
}

/// POST /members/edit_profile/
pub async fn edit_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<EditProfileForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    match accounts::update_profile(&mut conn, &user.id, &form) {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(AppError::Validation(errors)) => {
            let login_count = login_count(&conn, &user.id)?;
            Ok(rejected(EditProfileTemplate {
                username: Some(user.username),
                form,
                login_count,
                errors,
            }))
        }
        Err(e) => Err(e),
    }
}

// -- Password --

/// GET /members/password/
pub async fn change_password_page(user: CurrentUser) -> Html<ChangePasswordTemplate> {
    Html(ChangePasswordTemplate {
        username: Some(user.username),
        errors: FieldErrors::default(),
    })
}

/// POST /members/password/: the session making the change stays signed in;
/// every other session of the account is ended.
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Form(form): Form<PasswordChangeForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let account = users::find_by_id(&conn, &user.id)?.ok_or(AppError::NotFound)?;
    let current = session_token(&headers, &state.config.auth.cookie_name);

    match accounts::change_password(
        &mut conn,
        &account,
        &form,
        current,
        state.config.auth.bcrypt_cost,
    ) {
        Ok(()) => Ok(Redirect::to("/members/edit_profile/").into_response()),
        Err(AppError::Validation(errors)) => Ok(rejected(ChangePasswordTemplate {
            username: Some(user.username),
            errors,
        })),
        Err(e) => Err(e),
    }
}

fn login_count(conn: &rusqlite::Connection, user_id: &str) -> AppResult<i64> {
    Ok(login_counter::get(conn, user_id)?
        .map(|counter| counter.login_count)
        .unwrap_or_default())
}
