pub mod pagination;
pub mod rating;
pub mod repository;
pub mod review_state;

use serde::Serialize;

use crate::db::models::{Book, Review};

pub use pagination::Pagination;
pub use rating::{star_string, RatingSummary};
pub use repository::{CatalogRepository, RepositoryError, SqliteCatalogRepository};
pub use review_state::{ReviewPanel, ReviewWrite};

/// Validated book fields, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub genre: String,
    pub published_year: i32,
    pub cover_url: Option<String>,
}

/// Validated review fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: u8,
    pub review_text: String,
}

/// Listing request: free-text search plus a 1-based page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub search: String,
    pub page: u32,
}

impl BookQuery {
    pub fn new(search: impl AsRef<str>, page: u32) -> Self {
        Self {
            search: search.as_ref().trim().to_string(),
            page: page.max(1),
        }
    }

    /// Case-folded substring pattern for `fold_case(col) LIKE ... ESCAPE '\'`.
    pub fn like_pattern(&self) -> Option<String> {
        if self.search.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(self.search.len() + 2);
        pattern.push('%');
        for c in fold_case(&self.search).chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

impl Default for BookQuery {
    fn default() -> Self {
        Self::new("", 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    #[serde(flatten)]
    pub rating: RatingSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookPage {
    pub books: Vec<BookSummary>,
    pub pagination: Pagination,
}

impl BookPage {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    #[serde(rename = "addedByName")]
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "userName")]
    pub author_name: Option<String>,
}

impl ReviewWithAuthor {
    pub fn display_name(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewWithBook {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "bookTitle")]
    pub book_title: String,
}

/// Unicode lowercase used on both sides of a search comparison.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// A book may only be edited or deleted by the user who added it.
pub fn is_owner(book: &Book, user_id: Option<&str>) -> bool {
    user_id.is_some_and(|id| id == book.added_by)
}

/// Create the caller's review, or update it if one already exists for this book.
pub async fn submit_review(
    repo: &dyn CatalogRepository,
    book_id: &str,
    user_id: &str,
    input: &ReviewInput,
) -> Result<(ReviewWrite, Review), RepositoryError> {
    let existing = repo.find_review(book_id, user_id).await?;
    let write = ReviewWrite::for_existing(existing.as_ref());
    let saved = match &write {
        ReviewWrite::Create => repo.create_review(book_id, user_id, input).await?,
        ReviewWrite::Update { review_id } => repo.update_review(review_id, user_id, input).await?,
    };
    Ok((write, saved))
}
