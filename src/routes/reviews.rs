use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::catalog::{self, RepositoryError};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Flash};
use crate::forms::ReviewForm;
use crate::notice::{redirect_with_notice, Notice};
use crate::routes::books::detail_page;
use crate::routes::{page, page_with_status, Chrome, ConfirmForm, ConfirmTemplate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books/{id}/review", post(submit))
        .route(
            "/books/{id}/review/delete",
            get(delete_confirm).post(delete),
        )
}

/// POST /books/{id}/review: create the caller's review or update the existing one
pub async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(book_id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> AppResult<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let flash = Flash::default();
            let template =
                detail_page(&state, Some(user), &flash, &book_id, true, Some((&form, errors)))
                    .await?;
            return Ok(page_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                template,
                &flash,
            ));
        }
    };

    let book_href = format!("/books/{}", book_id);
    match catalog::submit_review(state.catalog.as_ref(), &book_id, &user.id, &input).await {
        Ok((write, _review)) => Ok(redirect_with_notice(
            &book_href,
            Notice::success(write.success_message()),
        )),
        // lost a race with another submit from the same user
        Err(RepositoryError::Conflict(msg)) => {
            Ok(redirect_with_notice(&book_href, Notice::error(msg)))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /books/{id}/review/delete
pub async fn delete_confirm(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
    Path(book_id): Path<String>,
) -> AppResult<Response> {
    state
        .catalog
        .find_review(&book_id, &user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let template = ConfirmTemplate {
        chrome: Chrome::new(Some(user), &flash),
        heading: "Are you sure?".to_string(),
        message: "This will permanently delete your review.".to_string(),
        action: format!("/books/{}/review/delete", book_id),
        cancel_href: format!("/books/{}", book_id),
    };
    Ok(page(template, &flash))
}

/// POST /books/{id}/review/delete
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(book_id): Path<String>,
    Form(confirm): Form<ConfirmForm>,
) -> AppResult<Response> {
    let review = state
        .catalog
        .find_review(&book_id, &user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !confirm.confirmed() {
        return Err(AppError::BadRequest("Deletion must be confirmed".into()));
    }

    state.catalog.delete_review(&review.id, &user.id).await?;
    Ok(redirect_with_notice(
        &format!("/books/{}", book_id),
        Notice::success("Review deleted"),
    ))
}
