//! Form payloads and their field-level validation.
//!
//! Validation happens before any database call; a failure is reported back
//! on the form as a map of field name to message.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::{NewBook, ReviewInput};

pub const TITLE_MAX: usize = 200;
pub const AUTHOR_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;
pub const GENRE_MAX: usize = 50;
pub const EARLIEST_YEAR: i32 = 1000;
pub const NAME_MIN: usize = 2;
pub const PASSWORD_MIN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Message for `field`, or an empty string.
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    max: usize,
    label: &str,
) {
    if value.is_empty() {
        errors.add(field, format!("{} is required", label));
    } else if char_len(value) > max {
        errors.add(field, format!("{} must be at most {} characters", label, max));
    }
}

/// Minimal shape check: one `@`, something before it, a dotted domain after it.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

fn is_web_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// -- Books --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: String,
    pub published_year: String,
    pub cover_url: String,
}

impl BookForm {
    pub fn validate(&self) -> Result<NewBook, FieldErrors> {
        use chrono::Datelike;
        self.validate_for_year(chrono::Utc::now().year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<NewBook, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        let author = self.author.trim();
        let genre = self.genre.trim();
        required(&mut errors, "title", title, TITLE_MAX, "Title");
        required(&mut errors, "author", author, AUTHOR_MAX, "Author");
        required(&mut errors, "genre", genre, GENRE_MAX, "Genre");

        let description = non_empty(&self.description);
        if description
            .as_deref()
            .is_some_and(|d| char_len(d) > DESCRIPTION_MAX)
        {
            errors.add(
                "description",
                format!("Description must be at most {} characters", DESCRIPTION_MAX),
            );
        }

        let published_year = match self.published_year.trim().parse::<i32>() {
            Ok(year) if (EARLIEST_YEAR..=current_year).contains(&year) => year,
            Ok(_) => {
                errors.add(
                    "published_year",
                    format!(
                        "Published year must be between {} and {}",
                        EARLIEST_YEAR, current_year
                    ),
                );
                0
            }
            Err(_) => {
                errors.add("published_year", "Published year must be a number");
                0
            }
        };

        let cover_url = non_empty(&self.cover_url);
        if cover_url.as_deref().is_some_and(|u| !is_web_url(u)) {
            errors.add("cover_url", "Invalid URL");
        }

        errors.into_result(|| NewBook {
            title: title.to_string(),
            author: author.to_string(),
            description,
            genre: genre.to_string(),
            published_year,
            cover_url,
        })
    }
}

impl From<&crate::db::models::Book> for BookForm {
    fn from(book: &crate::db::models::Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone().unwrap_or_default(),
            genre: book.genre.clone(),
            published_year: book.published_year.to_string(),
            cover_url: book.cover_url.clone().unwrap_or_default(),
        }
    }
}

// -- Reviews --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    /// `0` or empty means no star was picked.
    pub rating: String,
    pub review_text: String,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<ReviewInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let rating = match self.rating.trim().parse::<u8>() {
            Ok(r @ 1..=5) => r,
            _ => {
                errors.add("rating", "Please choose a rating from 1 to 5 stars");
                0
            }
        };

        let text = self.review_text.trim();
        if text.is_empty() {
            errors.add("review_text", "Please write a few words about this book");
        }

        errors.into_result(|| ReviewInput {
            rating,
            review_text: text.to_string(),
        })
    }

    /// Picked rating for re-rendering the form; 0 when none or invalid.
    pub fn selected_rating(&self) -> u8 {
        self.rating
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|r| (1..=5).contains(r))
            .unwrap_or(0)
    }
}

// -- Accounts --

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<SignUp, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if char_len(name) < NAME_MIN {
            errors.add(
                "name",
                format!("Name must be at least {} characters", NAME_MIN),
            );
        }
        let email = validate_email(&mut errors, &self.email);
        validate_password(&mut errors, &self.password);

        errors.into_result(|| SignUp {
            name: name.to_string(),
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    /// Returns the normalized email on success.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = validate_email(&mut errors, &self.email);
        validate_password(&mut errors, &self.password);
        errors.into_result(|| email)
    }
}

fn validate_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    if !is_plausible_email(&email) {
        errors.add("email", "Invalid email address");
    }
    email
}

fn validate_password(errors: &mut FieldErrors, password: &str) {
    if char_len(password) < PASSWORD_MIN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", PASSWORD_MIN),
        );
    }
}
