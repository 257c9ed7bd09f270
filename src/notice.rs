//! One-shot notices carried across a redirect in a short-lived cookie.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

pub const NOTICE_COOKIE: &str = "bookshelf_notice";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(NoticeKind::Success),
            "error" => Some(NoticeKind::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    /// Form-encoded so the value stays inside the cookie-octet charset.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("kind", self.kind.as_str())
            .append_pair("msg", &self.message)
            .finish()
    }

    pub fn decode(value: &str) -> Option<Self> {
        let mut kind = None;
        let mut message = None;
        for (key, val) in form_urlencoded::parse(value.as_bytes()) {
            match key.as_ref() {
                "kind" => kind = NoticeKind::parse(&val),
                "msg" => message = Some(val.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            kind: kind?,
            message: message.filter(|m| !m.is_empty())?,
        })
    }

    pub fn set_cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60",
            NOTICE_COOKIE,
            self.encode()
        )
    }
}

pub fn clear_notice_cookie() -> HeaderValue {
    HeaderValue::from_static("bookshelf_notice=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// 303 redirect that shows `notice` on the next rendered page.
pub fn redirect_with_notice(to: &str, notice: Notice) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, to.to_string()),
            (header::SET_COOKIE, notice.set_cookie()),
        ],
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_survives_cookie_encoding() {
        let notice = Notice::error("You can only edit your own books; sorry = no");
        let encoded = notice.encode();
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains(';'));
        assert_eq!(Notice::decode(&encoded), Some(notice));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(Notice::decode(""), None);
        assert_eq!(Notice::decode("kind=warning&msg=hi"), None);
        assert_eq!(Notice::decode("kind=success&msg="), None);
    }

    #[test]
    fn redirect_sets_location_and_cookie() {
        let response = redirect_with_notice("/", Notice::success("Book deleted successfully"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("bookshelf_notice=kind=success"));
    }
}
