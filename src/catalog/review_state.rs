// Review authoring state machine - pure, no side effects
use crate::db::models::Review;

/// What the signed-in user's review panel shows on a book page.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewPanel {
    /// User has not reviewed this book; the blank form is shown
    NoReview,

    /// User's review shown read-only with edit/delete controls
    Viewing(Review),

    /// Form pre-populated with the user's review
    Editing(Review),
}

/// Which write a submitted review form turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewWrite {
    Create,
    Update { review_id: String },
}

impl ReviewPanel {
    /// Derive the panel from the stored review and the `edit` request flag.
    pub fn resolve(existing: Option<Review>, wants_edit: bool) -> Self {
        match existing {
            None => ReviewPanel::NoReview,
            Some(review) if wants_edit => ReviewPanel::Editing(review),
            Some(review) => ReviewPanel::Viewing(review),
        }
    }

    pub fn review(&self) -> Option<&Review> {
        match self {
            ReviewPanel::NoReview => None,
            ReviewPanel::Viewing(review) | ReviewPanel::Editing(review) => Some(review),
        }
    }

    pub fn shows_form(&self) -> bool {
        !matches!(self, ReviewPanel::Viewing(_))
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, ReviewPanel::Editing(_))
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReviewPanel::Viewing(_) => "Your Review",
            _ => "Write a Review",
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self {
            ReviewPanel::Editing(_) => "Update Review",
            _ => "Submit Review",
        }
    }
}

impl ReviewWrite {
    /// Create and update are selected by whether (book, user) already has a row.
    pub fn for_existing(existing: Option<&Review>) -> Self {
        match existing {
            Some(review) => ReviewWrite::Update {
                review_id: review.id.clone(),
            },
            None => ReviewWrite::Create,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ReviewWrite::Create => "Review submitted successfully",
            ReviewWrite::Update { .. } => "Review updated successfully",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: "r1".into(),
            book_id: "b1".into(),
            user_id: "u1".into(),
            rating,
            review_text: "Solid".into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn without_review_edit_flag_is_ignored() {
        assert_eq!(ReviewPanel::resolve(None, true), ReviewPanel::NoReview);
        assert_eq!(ReviewPanel::resolve(None, false), ReviewPanel::NoReview);
    }

    #[test]
    fn existing_review_is_viewed_unless_editing() {
        assert_eq!(
            ReviewPanel::resolve(Some(review(3)), false),
            ReviewPanel::Viewing(review(3))
        );
        assert_eq!(
            ReviewPanel::resolve(Some(review(3)), true),
            ReviewPanel::Editing(review(3))
        );
    }

    #[test]
    fn panel_labels_follow_state() {
        let panel = ReviewPanel::resolve(None, false);
        assert!(panel.shows_form());
        assert!(!panel.is_editing());
        assert_eq!(panel.title(), "Write a Review");
        assert_eq!(panel.submit_label(), "Submit Review");
        assert_eq!(panel.review(), None);

        let panel = ReviewPanel::resolve(Some(review(4)), false);
        assert!(!panel.shows_form());
        assert_eq!(panel.title(), "Your Review");

        let panel = ReviewPanel::resolve(Some(review(4)), true);
        assert!(panel.shows_form());
        assert!(panel.is_editing());
        assert_eq!(panel.submit_label(), "Update Review");
        assert_eq!(panel.review().map(|r| r.rating), Some(4));
    }

    #[test]
    fn write_path_follows_existing_row() {
        assert_eq!(ReviewWrite::for_existing(None), ReviewWrite::Create);
        assert_eq!(
            ReviewWrite::for_existing(Some(&review(5))),
            ReviewWrite::Update {
                review_id: "r1".into()
            }
        );
        assert_eq!(
            ReviewWrite::Create.success_message(),
            "Review submitted successfully"
        );
    }
}
