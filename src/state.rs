use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::catalog::{CatalogRepository, SqliteCatalogRepository};
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub catalog: Arc<dyn CatalogRepository>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let catalog = Arc::new(SqliteCatalogRepository::new(db.clone()));
        Self {
            db,
            config,
            catalog,
        }
    }
}
