// Repository pattern - isolates all catalog database side effects
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use thiserror::Error;

use crate::catalog::{
    BookDetail, BookPage, BookQuery, BookSummary, NewBook, Pagination, RatingSummary,
    ReviewInput, ReviewWithAuthor, ReviewWithBook,
};
use crate::db::models::{Book, Profile, Review};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Repository trait - all book, review and profile reads and writes
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// One page of books matching the query, newest first, with rating summaries
    async fn list_books(
        &self,
        query: &BookQuery,
        page_size: u32,
    ) -> Result<BookPage, RepositoryError>;

    async fn get_book(&self, id: &str) -> Result<Option<BookDetail>, RepositoryError>;

    async fn create_book(&self, owner_id: &str, book: &NewBook) -> Result<Book, RepositoryError>;

    /// Last write wins; there is no version check
    async fn update_book(&self, id: &str, book: &NewBook) -> Result<Book, RepositoryError>;

    /// Reviews go with the book via `ON DELETE CASCADE`
    async fn delete_book(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn book_reviews(&self, book_id: &str) -> Result<Vec<ReviewWithAuthor>, RepositoryError>;

    async fn find_review(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Fails with `Conflict` if the user already reviewed this book
    async fn create_review(
        &self,
        book_id: &str,
        user_id: &str,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError>;

    /// Only touches the row if `user_id` wrote it
    async fn update_review(
        &self,
        review_id: &str,
        user_id: &str,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError>;

    async fn delete_review(&self, review_id: &str, user_id: &str) -> Result<bool, RepositoryError>;

    async fn books_by_owner(&self, user_id: &str) -> Result<Vec<BookSummary>, RepositoryError>;

    async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<ReviewWithBook>, RepositoryError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteCatalogRepository {
    pool: DbPool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.description, b.genre, b.published_year, \
                            b.cover_url, b.added_by, b.created_at, b.updated_at";

const REVIEW_COLUMNS: &str =
    "r.id, r.book_id, r.user_id, r.rating, r.review_text, r.created_at, r.updated_at";

const SEARCH_FILTER: &str =
    r"(?1 IS NULL OR fold_case(b.title) LIKE ?1 ESCAPE '\' OR fold_case(b.author) LIKE ?1 ESCAPE '\')";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        genre: row.get(4)?,
        published_year: row.get(5)?,
        cover_url: row.get(6)?,
        added_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Book columns followed by `SUM(rating)` and `COUNT(review)`.
fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<BookSummary> {
    let sum: i64 = row.get(10)?;
    let count: i64 = row.get(11)?;
    Ok(BookSummary {
        book: book_from_row(row)?,
        rating: RatingSummary::from_totals(
            u64::try_from(sum).unwrap_or(0),
            u32::try_from(count).unwrap_or(0),
        ),
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        book_id: row.get(1)?,
        user_id: row.get(2)?,
        rating: row.get(3)?,
        review_text: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn load_book(conn: &rusqlite::Connection, id: &str) -> Result<Book, RepositoryError> {
    conn.query_row(
        &format!("SELECT {} FROM books b WHERE b.id = ?1", BOOK_COLUMNS),
        params![id],
        book_from_row,
    )
    .optional()?
    .ok_or_else(|| RepositoryError::NotFound(format!("book {}", id)))
}

fn load_review(conn: &rusqlite::Connection, id: &str) -> Result<Review, RepositoryError> {
    conn.query_row(
        &format!("SELECT {} FROM reviews r WHERE r.id = ?1", REVIEW_COLUMNS),
        params![id],
        review_from_row,
    )
    .optional()?
    .ok_or_else(|| RepositoryError::NotFound(format!("review {}", id)))
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn list_books(
        &self,
        query: &BookQuery,
        page_size: u32,
    ) -> Result<BookPage, RepositoryError> {
        let conn = self.pool.get()?;
        let pattern = query.like_pattern();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM books b WHERE {}", SEARCH_FILTER),
            params![pattern],
            |row| row.get(0),
        )?;

        let pagination = Pagination::new(query.page, page_size, u64::try_from(total).unwrap_or(0));

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, COALESCE(SUM(r.rating), 0), COUNT(r.id)
             FROM books b
             LEFT JOIN reviews r ON r.book_id = b.id
             WHERE {}
             GROUP BY b.id
             ORDER BY b.created_at DESC, b.rowid DESC
             LIMIT ?2 OFFSET ?3",
            BOOK_COLUMNS, SEARCH_FILTER
        ))?;
        let books = stmt
            .query_map(
                params![
                    pattern,
                    i64::from(pagination.limit()),
                    i64::try_from(pagination.offset()).unwrap_or(i64::MAX)
                ],
                summary_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            search = %query.search,
            page = pagination.page,
            total,
            "Listed books"
        );

        Ok(BookPage { books, pagination })
    }

    async fn get_book(&self, id: &str) -> Result<Option<BookDetail>, RepositoryError> {
        let conn = self.pool.get()?;
        let detail = conn
            .query_row(
                &format!(
                    "SELECT {}, p.name FROM books b
                     LEFT JOIN profiles p ON p.id = b.added_by
                     WHERE b.id = ?1",
                    BOOK_COLUMNS
                ),
                params![id],
                |row| {
                    Ok(BookDetail {
                        book: book_from_row(row)?,
                        owner_name: row.get(10)?,
                    })
                },
            )
            .optional()?;
        Ok(detail)
    }

    async fn create_book(&self, owner_id: &str, book: &NewBook) -> Result<Book, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        conn.execute(
            "INSERT INTO books (id, title, author, description, genre, published_year, cover_url, added_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                book.title,
                book.author,
                book.description,
                book.genre,
                book.published_year,
                book.cover_url,
                owner_id
            ],
        )?;

        tracing::info!(book_id = %id, owner = %owner_id, "Book added");
        load_book(&conn, &id)
    }

    async fn update_book(&self, id: &str, book: &NewBook) -> Result<Book, RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "UPDATE books SET title = ?2, author = ?3, description = ?4, genre = ?5,
                 published_year = ?6, cover_url = ?7,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1",
            params![
                id,
                book.title,
                book.author,
                book.description,
                book.genre,
                book.published_year,
                book.cover_url
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("book {}", id)));
        }

        tracing::info!(book_id = %id, "Book updated");
        load_book(&conn, id)
    }

    async fn delete_book(&self, id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        if rows > 0 {
            tracing::info!(book_id = %id, "Book deleted");
        }
        Ok(rows > 0)
    }

    async fn book_reviews(&self, book_id: &str) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, p.name FROM reviews r
             LEFT JOIN profiles p ON p.id = r.user_id
             WHERE r.book_id = ?1
             ORDER BY r.created_at DESC, r.rowid DESC",
            REVIEW_COLUMNS
        ))?;
        let reviews = stmt
            .query_map(params![book_id], |row| {
                Ok(ReviewWithAuthor {
                    review: review_from_row(row)?,
                    author_name: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    async fn find_review(
        &self,
        book_id: &str,
        user_id: &str,
    ) -> Result<Option<Review>, RepositoryError> {
        let conn = self.pool.get()?;
        let review = conn
            .query_row(
                &format!(
                    "SELECT {} FROM reviews r WHERE r.book_id = ?1 AND r.user_id = ?2",
                    REVIEW_COLUMNS
                ),
                params![book_id, user_id],
                review_from_row,
            )
            .optional()?;
        Ok(review)
    }

    async fn create_review(
        &self,
        book_id: &str,
        user_id: &str,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();

        let result = conn.execute(
            "INSERT INTO reviews (id, book_id, user_id, rating, review_text)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, book_id, user_id, input.rating, input.review_text],
        );

        match result {
            Ok(_) => {}
            Err(e) => {
                return Err(match constraint_code(&e) {
                    Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) => RepositoryError::Conflict(
                        "You have already reviewed this book".to_string(),
                    ),
                    Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                        RepositoryError::NotFound(format!("book {}", book_id))
                    }
                    _ => e.into(),
                })
            }
        }

        tracing::info!(review_id = %id, book_id = %book_id, "Review created");
        load_review(&conn, &id)
    }

    async fn update_review(
        &self,
        review_id: &str,
        user_id: &str,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE reviews SET rating = ?3, review_text = ?4,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1 AND user_id = ?2",
            params![review_id, user_id, input.rating, input.review_text],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound(format!("review {}", review_id)));
        }

        tracing::info!(review_id = %review_id, "Review updated");
        load_review(&conn, review_id)
    }

    async fn delete_review(&self, review_id: &str, user_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM reviews WHERE id = ?1 AND user_id = ?2",
            params![review_id, user_id],
        )?;
        if rows > 0 {
            tracing::info!(review_id = %review_id, "Review deleted");
        }
        Ok(rows > 0)
    }

    async fn books_by_owner(&self, user_id: &str) -> Result<Vec<BookSummary>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, COALESCE(SUM(r.rating), 0), COUNT(r.id)
             FROM books b
             LEFT JOIN reviews r ON r.book_id = b.id
             WHERE b.added_by = ?1
             GROUP BY b.id
             ORDER BY b.created_at DESC, b.rowid DESC",
            BOOK_COLUMNS
        ))?;
        let books = stmt
            .query_map(params![user_id], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<ReviewWithBook>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, b.title FROM reviews r
             JOIN books b ON b.id = r.book_id
             WHERE r.user_id = ?1
             ORDER BY r.created_at DESC, r.rowid DESC",
            REVIEW_COLUMNS
        ))?;
        let reviews = stmt
            .query_map(params![user_id], |row| {
                Ok(ReviewWithBook {
                    review: review_from_row(row)?,
                    book_title: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RepositoryError> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                "SELECT id, name, created_at FROM profiles WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}
