// Library exports for Bookshelf
// This allows integration tests to drive the router and repository directly

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod notice;
pub mod routes;
pub mod state;
