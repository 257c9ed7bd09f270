use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::catalog::{BookDetail, BookSummary, RatingSummary, ReviewWithAuthor};
use crate::error::{AppError, AppResult};
use crate::routes::books::ListParams;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books))
        .route("/api/books/{id}", get(get_book))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub books: Vec<BookSummary>,
    pub total: u64,
    pub page: u32,
    pub page_count: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookDetail,
    #[serde(flatten)]
    pub rating: RatingSummary,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// GET /api/books?q=&page=
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<BookListResponse>> {
    let listing = state
        .catalog
        .list_books(&params.to_query(), state.config.catalog.page_size)
        .await?;
    let pagination = listing.pagination;

    Ok(Json(BookListResponse {
        books: listing.books,
        total: pagination.total,
        page: pagination.page,
        page_count: pagination.page_count(),
        page_size: pagination.page_size,
    }))
}

/// GET /api/books/{id}
async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDetailResponse>> {
    let book = state
        .catalog
        .get_book(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    let reviews = state.catalog.book_reviews(&id).await?;
    let rating = RatingSummary::from_ratings(reviews.iter().map(|r| r.review.rating));

    Ok(Json(BookDetailResponse {
        book,
        rating,
        reviews,
    }))
}
