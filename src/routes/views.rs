//! Flattened, template-ready shapes of catalog data.

use url::form_urlencoded;

use crate::catalog::{star_string, BookSummary, Pagination, ReviewWithAuthor, ReviewWithBook};
use crate::db::models::Review;

pub struct BookCard {
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub cover_url: String,
    pub stars: String,
    pub average: String,
    pub review_count: u32,
}

impl BookCard {
    pub fn has_cover(&self) -> bool {
        !self.cover_url.is_empty()
    }
}

impl From<BookSummary> for BookCard {
    fn from(summary: BookSummary) -> Self {
        let BookSummary { book, rating } = summary;
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            published_year: book.published_year,
            cover_url: book.cover_url.unwrap_or_default(),
            stars: star_string(rating.rounded_stars()),
            average: rating.display_average(),
            review_count: rating.count,
        }
    }
}

pub struct ReviewCard {
    pub id: String,
    pub book_id: String,
    pub book_title: String,
    pub author_name: String,
    pub stars: String,
    pub text: String,
    pub date: String,
    pub is_mine: bool,
}

impl ReviewCard {
    fn from_review(review: Review, author_name: String, book_title: String, is_mine: bool) -> Self {
        Self {
            stars: star_string(review.rating),
            date: display_date(&review.created_at),
            id: review.id,
            book_id: review.book_id,
            book_title,
            author_name,
            text: review.review_text,
            is_mine,
        }
    }

    pub fn for_book(review: ReviewWithAuthor, viewer_id: Option<&str>) -> Self {
        let is_mine = viewer_id.is_some_and(|id| id == review.review.user_id);
        let author = review.display_name().to_string();
        Self::from_review(review.review, author, String::new(), is_mine)
    }

    pub fn for_profile(review: ReviewWithBook, author_name: &str) -> Self {
        Self::from_review(review.review, author_name.to_string(), review.book_title, true)
    }
}

/// `2026-03-04T10:00:00.000Z` -> `Mar 4, 2026`; unparsable input is shown as-is.
pub fn display_date(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
}

pub struct Pager {
    pub show: bool,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_href: String,
    pub next_href: String,
    pub links: Vec<PageLink>,
}

impl Pager {
    pub fn new(pagination: &Pagination, search: &str) -> Self {
        let links = (1..=pagination.page_count())
            .map(|number| PageLink {
                number,
                href: list_href(search, number),
                is_current: number == pagination.page,
            })
            .collect();
        Self {
            show: pagination.shows_controls(),
            has_previous: pagination.has_previous(),
            has_next: pagination.has_next(),
            previous_href: list_href(search, pagination.previous()),
            next_href: list_href(search, pagination.next()),
            links,
        }
    }
}

/// Listing URL that keeps the current search.
pub fn list_href(search: &str, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if !search.is_empty() {
        query.append_pair("q", search);
    }
    query.append_pair("page", &page.to_string());
    format!("/?{}", query.finish())
}

pub struct StarOption {
    pub value: u8,
    pub checked: bool,
}

pub fn star_options(selected: u8) -> Vec<StarOption> {
    (1..=5)
        .map(|value| StarOption {
            value,
            checked: value == selected,
        })
        .collect()
}
