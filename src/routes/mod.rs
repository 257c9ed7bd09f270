pub mod api;
pub mod assets;
pub mod auth;
pub mod books;
pub mod profile;
pub mod reviews;
pub mod views;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::extractors::{CurrentUser, Flash};
use crate::notice::{clear_notice_cookie, Notice};
use crate::state::AppState;

/// The whole application: pages, form posts, JSON reads and assets.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(books::index))
        .merge(books::router())
        .merge(reviews::router())
        .merge(auth::router())
        .merge(profile::router())
        .merge(api::router())
        .route("/assets/{*path}", get(assets::serve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Render a full page. A notice shown here is spent, so its cookie is cleared.
pub fn page<T: Template>(template: T, flash: &Flash) -> Response {
    page_with_status(StatusCode::OK, template, flash)
}

pub fn page_with_status<T: Template>(status: StatusCode, template: T, flash: &Flash) -> Response {
    let mut response = Html(template).into_response();
    if response.status() == StatusCode::OK {
        *response.status_mut() = status;
    }
    if flash.is_present() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_notice_cookie());
    }
    response
}

/// Navigation and notice data every page layout needs.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub user: Option<CurrentUser>,
    pub notice: Option<Notice>,
}

impl Chrome {
    pub fn new(user: Option<CurrentUser>, flash: &Flash) -> Self {
        Self {
            user,
            notice: flash.0.clone(),
        }
    }

    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }

    pub fn user_email(&self) -> &str {
        self.user.as_ref().map(|u| u.email.as_str()).unwrap_or("")
    }

    pub fn has_notice(&self) -> bool {
        self.notice.is_some()
    }

    pub fn notice_message(&self) -> &str {
        self.notice.as_ref().map(|n| n.message.as_str()).unwrap_or("")
    }

    pub fn notice_class(&self) -> &'static str {
        match &self.notice {
            Some(n) if n.is_error() => "notice notice-error",
            _ => "notice notice-success",
        }
    }
}

/// Body of every destructive POST; the confirmation page supplies `yes`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub confirm: String,
}

impl ConfirmForm {
    pub fn confirmed(&self) -> bool {
        self.confirm == "yes"
    }
}

#[derive(Template)]
#[template(path = "pages/confirm.html")]
pub struct ConfirmTemplate {
    pub chrome: Chrome,
    pub heading: String,
    pub message: String,
    pub action: String,
    pub cancel_href: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NOTICE_COOKIE;

    fn confirm_page() -> ConfirmTemplate {
        ConfirmTemplate {
            chrome: Chrome::default(),
            heading: "Are you sure?".into(),
            message: "This will permanently delete your review.".into(),
            action: "/books/b1/review/delete".into(),
            cancel_href: "/books/b1".into(),
        }
    }

    #[test]
    fn page_without_notice_sets_no_cookie() {
        let response = page(confirm_page(), &Flash::default());
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn page_with_notice_clears_it() {
        let flash = Flash(Some(Notice::success("Review deleted")));
        let response = page_with_status(StatusCode::UNPROCESSABLE_ENTITY, confirm_page(), &flash);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=;", NOTICE_COOKIE)));
    }

    #[test]
    fn confirm_page_posts_confirmation() {
        let body = confirm_page().render().unwrap();
        assert!(body.contains(r#"action="/books/b1/review/delete""#));
        assert!(body.contains(r#"name="confirm" value="yes""#));
    }

    #[test]
    fn confirm_form_requires_yes() {
        assert!(ConfirmForm {
            confirm: "yes".into()
        }
        .confirmed());
        assert!(!ConfirmForm::default().confirmed());
    }
}
