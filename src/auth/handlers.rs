use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::accounts::{self, SignUpOutcome};
use crate::auth::session;
use crate::error::AppResult;
use crate::extractors::{cookie_value, Flash, MaybeUser};
use crate::forms::{FieldErrors, SignInForm, SignUpForm};
use crate::notice::{redirect_with_notice, Notice};
use crate::routes::{page, page_with_status, Chrome};
use crate::state::AppState;

// -- Templates --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    SignUp,
}

impl AuthMode {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("signup") => AuthMode::SignUp,
            _ => AuthMode::Login,
        }
    }
}

#[derive(Template)]
#[template(path = "pages/auth.html")]
pub struct AuthTemplate {
    pub chrome: Chrome,
    pub is_signup: bool,
    pub name: String,
    pub email: String,
    pub errors: FieldErrors,
}

impl AuthTemplate {
    fn new(mode: AuthMode, flash: &Flash) -> Self {
        Self {
            chrome: Chrome::new(None, flash),
            is_signup: mode == AuthMode::SignUp,
            name: String::new(),
            email: String::new(),
            errors: FieldErrors::new(),
        }
    }

    fn rejected(mode: AuthMode, name: &str, email: &str, errors: FieldErrors) -> Response {
        let flash = Flash::default();
        let template = Self {
            name: name.to_string(),
            email: email.to_string(),
            errors,
            ..Self::new(mode, &flash)
        };
        page_with_status(StatusCode::UNPROCESSABLE_ENTITY, template, &flash)
    }
}

#[derive(Deserialize)]
pub struct AuthQuery {
    pub mode: Option<String>,
}

// -- Form page --

/// GET /auth?mode=login|signup: signed-in users go straight home
pub async fn auth_page(
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Query(query): Query<AuthQuery>,
) -> AppResult<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let template = AuthTemplate::new(AuthMode::parse(query.mode.as_deref()), &flash);
    Ok(page(template, &flash))
}

// -- Sign up --

/// POST /auth/signup: create the account, then ask the user to sign in
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> AppResult<Response> {
    let sign_up = match form.validate() {
        Ok(sign_up) => sign_up,
        Err(errors) => {
            return Ok(AuthTemplate::rejected(
                AuthMode::SignUp,
                &form.name,
                &form.email,
                errors,
            ))
        }
    };

    match accounts::create_account(&state.db, &sign_up)? {
        SignUpOutcome::Created { .. } => Ok(redirect_with_notice(
            "/auth?mode=login",
            Notice::success("Account created. Please sign in."),
        )),
        SignUpOutcome::EmailTaken => {
            let mut errors = FieldErrors::new();
            errors.add("email", "An account with this email already exists");
            Ok(AuthTemplate::rejected(
                AuthMode::SignUp,
                &sign_up.name,
                &sign_up.email,
                errors,
            ))
        }
    }
}

// -- Sign in --

/// POST /auth/login: check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> AppResult<Response> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(AuthTemplate::rejected(AuthMode::Login, "", &form.email, errors)),
    };

    let Some(user_id) = accounts::verify_credentials(&state.db, &email, &form.password)? else {
        tracing::info!("Failed sign-in attempt");
        let mut errors = FieldErrors::new();
        errors.add("form", "Invalid email or password");
        return Ok(AuthTemplate::rejected(AuthMode::Login, "", &email, errors));
    };

    let auth = &state.config.auth;
    let token = session::create_session(&state.db, &user_id, auth.session_hours)?;

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/".to_string())],
        AppendHeaders([
            (
                header::SET_COOKIE,
                session::session_cookie(&auth.cookie_name, &token, auth.session_hours),
            ),
            (
                header::SET_COOKIE,
                Notice::success("Signed in successfully").set_cookie(),
            ),
        ]),
    )
        .into_response())
}

// -- Logout --

/// POST /auth/logout: delete session and redirect
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;

    if let Some(token) = cookie_value(&headers, cookie_name) {
        if let Err(e) = session::delete_session(&state.db, token) {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/".to_string())],
        AppendHeaders([
            (header::SET_COOKIE, session::clear_session_cookie(cookie_name)),
            (header::SET_COOKIE, Notice::success("Signed out").set_cookie()),
        ]),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_login() {
        assert_eq!(AuthMode::parse(None), AuthMode::Login);
        assert_eq!(AuthMode::parse(Some("bogus")), AuthMode::Login);
        assert_eq!(AuthMode::parse(Some("signup")), AuthMode::SignUp);
    }

    #[test]
    fn signup_form_shows_name_field() {
        let body = AuthTemplate::new(AuthMode::SignUp, &Flash::default())
            .render()
            .unwrap();
        assert!(body.contains(r#"name="name""#));
        assert!(body.contains(r#"action="/auth/signup""#));

        let body = AuthTemplate::new(AuthMode::Login, &Flash::default())
            .render()
            .unwrap();
        assert!(!body.contains(r#"name="name""#));
        assert!(body.contains(r#"action="/auth/login""#));
    }

    #[test]
    fn rejected_form_is_unprocessable() {
        let mut errors = FieldErrors::new();
        errors.add("form", "Invalid email or password");
        let response = AuthTemplate::rejected(AuthMode::Login, "", "a@b.co", errors);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
