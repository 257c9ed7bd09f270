//! Catalog repository against a real SQLite file.
//!
//! Tests cover:
//! - Listing order, paging and page clamping
//! - Search by title or author
//! - One review per user per book, enforced by the schema
//! - Cascading deletes and the profile views

use bookshelf::catalog::{
    self, BookQuery, CatalogRepository, NewBook, RepositoryError, ReviewInput, ReviewWrite,
    SqliteCatalogRepository,
};
use bookshelf::db;
use bookshelf::state::DbPool;
use rusqlite::params;
use tempfile::TempDir;

// Helper to create a migrated database and its repository
fn setup() -> (TempDir, DbPool, SqliteCatalogRepository) {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::create_pool(&temp_dir.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();
    let repo = SqliteCatalogRepository::new(pool.clone());
    (temp_dir, pool, repo)
}

// Helper to insert a user with a profile; password login is not exercised here
fn insert_user(pool: &DbPool, id: &str, name: &str) {
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, 'x')",
        params![id, format!("{}@example.com", id)],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO profiles (id, name) VALUES (?1, ?2)",
        params![id, name],
    )
    .unwrap();
}

fn new_book(title: &str, author: &str) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: author.to_string(),
        description: None,
        genre: "Fiction".to_string(),
        published_year: 1990,
        cover_url: None,
    }
}

fn review(rating: u8, text: &str) -> ReviewInput {
    ReviewInput {
        rating,
        review_text: text.to_string(),
    }
}

#[tokio::test]
async fn listing_pages_newest_first_and_clamps() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    for i in 1..=7 {
        repo.create_book("alice", &new_book(&format!("Book {}", i), "Anon"))
            .await
            .unwrap();
    }

    let first = repo.list_books(&BookQuery::new("", 1), 6).await.unwrap();
    assert_eq!(first.books.len(), 6);
    assert_eq!(first.books[0].book.title, "Book 7");
    assert_eq!(first.pagination.total, 7);
    assert_eq!(first.pagination.page_count(), 2);

    let past_end = repo.list_books(&BookQuery::new("", 40), 6).await.unwrap();
    assert_eq!(past_end.pagination.page, 2);
    assert_eq!(past_end.books.len(), 1);
    assert_eq!(past_end.books[0].book.title, "Book 1");
}

#[tokio::test]
async fn search_matches_title_or_author() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    repo.create_book("alice", &new_book("The Hobbit", "J.R.R. Tolkien"))
        .await
        .unwrap();
    repo.create_book("alice", &new_book("Dune", "Frank Herbert"))
        .await
        .unwrap();
    repo.create_book("alice", &new_book("Tolkien: A Biography", "Humphrey Carpenter"))
        .await
        .unwrap();

    let found = repo
        .list_books(&BookQuery::new("tolkien", 1), 6)
        .await
        .unwrap();
    assert_eq!(found.pagination.total, 2);

    let none = repo.list_books(&BookQuery::new("zzz", 1), 6).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(none.pagination.page, 1);
}

#[tokio::test]
async fn second_submit_updates_the_same_review() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    insert_user(&pool, "bob", "Bob");
    let book = repo.create_book("alice", &new_book("Dune", "Frank Herbert")).await.unwrap();

    let (write, first) = catalog::submit_review(&repo, &book.id, "bob", &review(4, "Great"))
        .await
        .unwrap();
    assert_eq!(write, ReviewWrite::Create);

    let (write, second) = catalog::submit_review(&repo, &book.id, "bob", &review(2, "Meh on reread"))
        .await
        .unwrap();
    assert!(matches!(write, ReviewWrite::Update { .. }));
    assert_eq!(second.id, first.id);

    let reviews = repo.book_reviews(&book.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review.rating, 2);
    assert_eq!(reviews[0].display_name(), "Bob");

    let err = repo
        .create_review(&book.id, "bob", &review(5, "again"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn deleting_a_book_removes_its_reviews() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    insert_user(&pool, "bob", "Bob");
    let book = repo.create_book("alice", &new_book("Dune", "Frank Herbert")).await.unwrap();
    repo.create_review(&book.id, "bob", &review(5, "Loved it"))
        .await
        .unwrap();

    assert!(repo.delete_book(&book.id).await.unwrap());
    assert!(repo.get_book(&book.id).await.unwrap().is_none());
    assert!(repo.reviews_by_user("bob").await.unwrap().is_empty());
    assert!(!repo.delete_book(&book.id).await.unwrap());
}

#[tokio::test]
async fn review_changes_are_scoped_to_their_author() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    insert_user(&pool, "bob", "Bob");
    let book = repo.create_book("alice", &new_book("Dune", "Frank Herbert")).await.unwrap();
    let bobs = repo
        .create_review(&book.id, "bob", &review(3, "Fine"))
        .await
        .unwrap();

    assert!(!repo.delete_review(&bobs.id, "alice").await.unwrap());
    assert!(repo.find_review(&book.id, "bob").await.unwrap().is_some());

    assert!(repo.delete_review(&bobs.id, "bob").await.unwrap());
    assert!(repo.find_review(&book.id, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn profile_lists_own_books_and_reviews() {
    let (_dir, pool, repo) = setup();
    insert_user(&pool, "alice", "Alice");
    insert_user(&pool, "bob", "Bob");
    let dune = repo.create_book("alice", &new_book("Dune", "Frank Herbert")).await.unwrap();
    repo.create_book("bob", &new_book("Emma", "Jane Austen"))
        .await
        .unwrap();
    repo.create_review(&dune.id, "bob", &review(5, "Classic"))
        .await
        .unwrap();

    let books = repo.books_by_owner("alice").await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].rating.count, 1);
    assert_eq!(books[0].rating.average, 5.0);

    let reviews = repo.reviews_by_user("bob").await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].book_title, "Dune");

    let profile = repo.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(profile.name, "Bob");
}
