use askama::Template;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::catalog::RatingSummary;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Flash};
use crate::routes::views::{BookCard, ReviewCard};
use crate::routes::{page, Chrome};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub chrome: Chrome,
    pub name: String,
    pub books: Vec<BookCard>,
    pub reviews: Vec<ReviewCard>,
    pub average_given: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

/// GET /profile: the signed-in user's books, reviews and rating habits
async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
) -> AppResult<Response> {
    let name = state
        .catalog
        .get_profile(&user.id)
        .await?
        .map(|p| p.name)
        .unwrap_or_else(|| user.name.clone());

    let books = state.catalog.books_by_owner(&user.id).await?;
    let reviews = state.catalog.reviews_by_user(&user.id).await?;
    let given = RatingSummary::from_ratings(reviews.iter().map(|r| r.review.rating));

    let template = ProfileTemplate {
        books: books.into_iter().map(BookCard::from).collect(),
        reviews: reviews
            .into_iter()
            .map(|r| ReviewCard::for_profile(r, &name))
            .collect(),
        average_given: given.display_average(),
        chrome: Chrome::new(Some(user), &flash),
        name,
    };
    Ok(page(template, &flash))
}
