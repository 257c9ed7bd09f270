use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Datelike;
use serde::Deserialize;

use crate::catalog::pagination::parse_page;
use crate::catalog::{is_owner, star_string, BookDetail, BookQuery, RatingSummary, ReviewPanel};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Flash, MaybeUser};
use crate::forms::{BookForm, FieldErrors, ReviewForm};
use crate::notice::{redirect_with_notice, Notice};
use crate::routes::views::{star_options, BookCard, Pager, ReviewCard, StarOption};
use crate::routes::{page, page_with_status, Chrome, ConfirmForm, ConfirmTemplate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", post(create))
        .route("/books/new", get(new_form))
        .route("/books/{id}", get(show))
        .route("/books/{id}/edit", get(edit_form).post(update))
        .route("/books/{id}/delete", get(delete_confirm).post(delete))
}

// -- Listing --

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> BookQuery {
        BookQuery::new(
            self.q.as_deref().unwrap_or(""),
            parse_page(self.page.as_deref()),
        )
    }
}

#[derive(Template)]
#[template(path = "pages/books.html")]
pub struct BookListTemplate {
    pub chrome: Chrome,
    pub search: String,
    pub books: Vec<BookCard>,
    pub pager: Pager,
    pub empty_message: &'static str,
}

/// GET /: newest books first, filtered by `q`, paged by `page`
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let query = params.to_query();
    let listing = state
        .catalog
        .list_books(&query, state.config.catalog.page_size)
        .await?;

    let empty_message = if query.search.is_empty() {
        "No books found. Add some books to get started!"
    } else {
        "No books match your search."
    };

    let template = BookListTemplate {
        chrome: Chrome::new(user, &flash),
        pager: Pager::new(&listing.pagination, &query.search),
        books: listing.books.into_iter().map(BookCard::from).collect(),
        search: query.search,
        empty_message,
    };
    Ok(page(template, &flash))
}

// -- Detail --

#[derive(Debug, Default, Deserialize)]
pub struct ShowParams {
    pub edit: Option<String>,
}

impl ShowParams {
    fn wants_edit(&self) -> bool {
        matches!(self.edit.as_deref(), Some("1" | "true" | "yes"))
    }
}

/// Review panel as rendered: state plus the form values to show.
pub struct PanelView {
    pub signed_in: bool,
    pub title: &'static str,
    pub shows_form: bool,
    pub is_editing: bool,
    pub has_review: bool,
    pub submit_label: &'static str,
    pub review_text: String,
    pub own_stars: String,
    pub own_text: String,
    pub star_options: Vec<StarOption>,
}

impl PanelView {
    fn new(panel: &ReviewPanel, signed_in: bool, submitted: Option<&ReviewForm>) -> Self {
        let (rating, review_text) = match (submitted, panel) {
            (Some(form), _) => (form.selected_rating(), form.review_text.clone()),
            (None, ReviewPanel::Editing(review)) => (review.rating, review.review_text.clone()),
            (None, _) => (0, String::new()),
        };
        let (own_stars, own_text) = match panel.review() {
            Some(review) => (star_string(review.rating), review.review_text.clone()),
            None => (String::new(), String::new()),
        };
        Self {
            signed_in,
            title: panel.title(),
            shows_form: panel.shows_form(),
            is_editing: panel.is_editing(),
            has_review: panel.review().is_some(),
            submit_label: panel.submit_label(),
            review_text,
            own_stars,
            own_text,
            star_options: star_options(rating),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/book.html")]
pub struct BookDetailTemplate {
    pub chrome: Chrome,
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub description: String,
    pub cover_url: String,
    pub owner_name: String,
    pub is_owner: bool,
    pub stars: String,
    pub average: String,
    pub review_count: u32,
    pub panel: PanelView,
    pub reviews: Vec<ReviewCard>,
    pub errors: FieldErrors,
}

/// Everything needed to draw a book page; shared by GET and a failed review POST.
pub(crate) async fn detail_page(
    state: &AppState,
    user: Option<CurrentUser>,
    flash: &Flash,
    book_id: &str,
    wants_edit: bool,
    submitted: Option<(&ReviewForm, FieldErrors)>,
) -> AppResult<BookDetailTemplate> {
    let BookDetail { book, owner_name } = state
        .catalog
        .get_book(book_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let reviews = state.catalog.book_reviews(book_id).await?;

    let viewer_id = user.as_ref().map(|u| u.id.as_str());
    let rating = RatingSummary::from_ratings(reviews.iter().map(|r| r.review.rating));
    let existing = viewer_id.and_then(|id| {
        reviews
            .iter()
            .find(|r| r.review.user_id == id)
            .map(|r| r.review.clone())
    });

    let (form, errors) = match submitted {
        Some((form, errors)) => (Some(form), errors),
        None => (None, FieldErrors::new()),
    };
    // a rejected submit keeps the form open
    let panel = ReviewPanel::resolve(existing, wants_edit || form.is_some());
    let panel_view = PanelView::new(&panel, viewer_id.is_some(), form);
    let is_owner = is_owner(&book, viewer_id);

    Ok(BookDetailTemplate {
        reviews: reviews
            .into_iter()
            .map(|r| ReviewCard::for_book(r, viewer_id))
            .collect(),
        chrome: Chrome::new(user, flash),
        id: book.id,
        title: book.title,
        author: book.author,
        genre: book.genre,
        published_year: book.published_year,
        description: book.description.unwrap_or_default(),
        cover_url: book.cover_url.unwrap_or_default(),
        owner_name: owner_name.unwrap_or_else(|| "Unknown".to_string()),
        is_owner,
        stars: star_string(rating.rounded_stars()),
        average: rating.display_average(),
        review_count: rating.count,
        panel: panel_view,
        errors,
    })
}

/// GET /books/{id}: book, its rating summary, reviews and the viewer's review panel
pub async fn show(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    flash: Flash,
    Path(id): Path<String>,
    Query(params): Query<ShowParams>,
) -> AppResult<Response> {
    let template = detail_page(&state, user, &flash, &id, params.wants_edit(), None).await?;
    Ok(page(template, &flash))
}

// -- Add / edit --

#[derive(Template)]
#[template(path = "pages/book_form.html")]
pub struct BookFormTemplate {
    pub chrome: Chrome,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub cancel_href: String,
    pub form: BookForm,
    pub errors: FieldErrors,
}

impl BookFormTemplate {
    fn add(user: CurrentUser, flash: &Flash, form: BookForm, errors: FieldErrors) -> Self {
        Self {
            chrome: Chrome::new(Some(user), flash),
            heading: "Add New Book",
            action: "/books".to_string(),
            submit_label: "Add Book",
            cancel_href: "/".to_string(),
            form,
            errors,
        }
    }

    fn edit(
        user: CurrentUser,
        flash: &Flash,
        book_id: &str,
        form: BookForm,
        errors: FieldErrors,
    ) -> Self {
        Self {
            chrome: Chrome::new(Some(user), flash),
            heading: "Edit Book",
            action: format!("/books/{}/edit", book_id),
            submit_label: "Update Book",
            cancel_href: format!("/books/{}", book_id),
            form,
            errors,
        }
    }
}

/// GET /books/new
pub async fn new_form(user: CurrentUser, flash: Flash) -> AppResult<Response> {
    let form = BookForm {
        published_year: chrono::Utc::now().year().to_string(),
        ..BookForm::default()
    };
    let template = BookFormTemplate::add(user, &flash, form, FieldErrors::new());
    Ok(page(template, &flash))
}

/// POST /books
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    let new_book = match form.validate() {
        Ok(book) => book,
        Err(errors) => {
            let template = BookFormTemplate::add(user, &Flash::default(), form, errors);
            return Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                template,
                &Flash::default(),
            ));
        }
    };

    let book = state.catalog.create_book(&user.id, &new_book).await?;
    Ok(redirect_with_notice(
        &format!("/books/{}", book.id),
        Notice::success("Book added successfully"),
    ))
}

/// Load a book and make sure `user` added it.
async fn owned_book(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
    verb: &str,
) -> AppResult<BookDetail> {
    let detail = state
        .catalog
        .get_book(id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !is_owner(&detail.book, Some(&user.id)) {
        return Err(AppError::Forbidden(format!(
            "You can only {} your own books",
            verb
        )));
    }
    Ok(detail)
}

/// GET /books/{id}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let detail = owned_book(&state, &user, &id, "edit").await?;
    let form = BookForm::from(&detail.book);
    let template = BookFormTemplate::edit(user, &flash, &id, form, FieldErrors::new());
    Ok(page(template, &flash))
}

/// POST /books/{id}/edit
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    owned_book(&state, &user, &id, "edit").await?;

    let changes = match form.validate() {
        Ok(book) => book,
        Err(errors) => {
            let template = BookFormTemplate::edit(user, &Flash::default(), &id, form, errors);
            return Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                template,
                &Flash::default(),
            ));
        }
    };

    state.catalog.update_book(&id, &changes).await?;
    Ok(redirect_with_notice(
        &format!("/books/{}", id),
        Notice::success("Book updated successfully"),
    ))
}

// -- Delete --

/// GET /books/{id}/delete: confirmation step before the destructive POST
pub async fn delete_confirm(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let detail = owned_book(&state, &user, &id, "delete").await?;
    let template = ConfirmTemplate {
        chrome: Chrome::new(Some(user), &flash),
        heading: format!("Delete \u{201c}{}\u{201d}?", detail.book.title),
        message: "This will permanently delete this book and all its reviews.".to_string(),
        action: format!("/books/{}/delete", id),
        cancel_href: format!("/books/{}", id),
    };
    Ok(page(template, &flash))
}

/// POST /books/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(confirm): Form<ConfirmForm>,
) -> AppResult<Response> {
    owned_book(&state, &user, &id, "delete").await?;
    if !confirm.confirmed() {
        return Err(AppError::BadRequest("Deletion must be confirmed".into()));
    }

    if !state.catalog.delete_book(&id).await? {
        return Err(AppError::NotFound);
    }
    Ok(redirect_with_notice(
        "/",
        Notice::success("Book deleted successfully"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_default_to_first_page() {
        let query = ListParams::default().to_query();
        assert_eq!(query, BookQuery::new("", 1));

        let query = ListParams {
            q: Some("  tolkien ".into()),
            page: Some("junk".into()),
        }
        .to_query();
        assert_eq!(query, BookQuery::new("tolkien", 1));
    }

    #[test]
    fn edit_flag_accepts_common_truthy_values() {
        for (raw, expected) in [(Some("1"), true), (Some("true"), true), (Some("0"), false), (None, false)] {
            let params = ShowParams {
                edit: raw.map(String::from),
            };
            assert_eq!(params.wants_edit(), expected, "{:?}", raw);
        }
    }

    #[test]
    fn empty_form_renders_with_errors() {
        let user = CurrentUser {
            id: "u1".into(),
            email: "a@b.co".into(),
            name: "Ada".into(),
        };
        let errors = BookForm::default().validate_for_year(2026).unwrap_err();
        let body = BookFormTemplate::add(user, &Flash::default(), BookForm::default(), errors)
            .render()
            .unwrap();
        assert!(body.contains("Title is required"));
        assert!(body.contains(r#"action="/books""#));
    }
}
