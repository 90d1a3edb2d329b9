use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{Solution, TagWithCount};
use crate::database::sqlite::queries::{SolutionQueries, TagQueries};
use crate::taxonomy::TagCategory;

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Schema statements, executed idempotently at startup. The FTS5 table is
/// maintained explicitly by `SolutionQueries::insert`/`delete` inside the
/// same transaction as the canonical row, so the keyword index matches the
/// `solutions` table immediately after any mutation.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS solutions (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        problem TEXT NOT NULL,
        root_cause TEXT,
        solution TEXT NOT NULL,
        error_messages TEXT,
        project_name TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        category TEXT NOT NULL CHECK(category IN ('tech_stack', 'problem_type', 'error_code'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS solution_tags (
        solution_id TEXT REFERENCES solutions(id) ON DELETE CASCADE,
        tag_id INTEGER REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (solution_id, tag_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_solutions_created_at ON solutions(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_tags_category ON tags(category)",
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS solutions_fts USING fts5(
        id UNINDEXED,
        title,
        problem,
        solution,
        error_messages
    )
    "#,
];

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.init_schema().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema statement")?;
        }

        debug!("Database schema initialized successfully");
        Ok(())
    }

    #[inline]
    pub async fn initialize_from_data_dir(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;

        Self::new(data_dir.join("solutions.db")).await
    }

    // Solution operations

    /// Persist the canonical row, keyword-index entry, and tag links in one
    /// transaction
    #[inline]
    pub async fn save_solution(&self, solution: &Solution) -> Result<()> {
        SolutionQueries::insert(&self.pool, solution).await
    }

    #[inline]
    pub async fn get_solution(&self, id: &str) -> Result<Option<Solution>> {
        SolutionQueries::get_by_id(&self.pool, id).await
    }

    #[inline]
    pub async fn get_solutions_by_ids(&self, ids: &[String]) -> Result<Vec<Solution>> {
        SolutionQueries::get_by_ids(&self.pool, ids).await
    }

    /// Keyword search; scores are normalized into (0, 1] with the best hit
    /// at 1.0
    #[inline]
    pub async fn search_keyword(&self, query: &str, limit: usize) -> Result<Vec<(String, f64)>> {
        SolutionQueries::search_fts(&self.pool, query, limit).await
    }

    #[inline]
    pub async fn filter_by_tags(
        &self,
        solution_ids: &[String],
        tags: &[String],
    ) -> Result<Vec<String>> {
        TagQueries::filter_by_tags(&self.pool, solution_ids, tags).await
    }

    /// Returns whether a record existed
    #[inline]
    pub async fn delete_solution(&self, id: &str) -> Result<bool> {
        SolutionQueries::delete(&self.pool, id).await
    }

    #[inline]
    pub async fn list_solution_ids(&self) -> Result<Vec<String>> {
        SolutionQueries::list_ids(&self.pool).await
    }

    #[inline]
    pub async fn count_solutions(&self) -> Result<i64> {
        SolutionQueries::count(&self.pool).await
    }

    // Tag operations

    #[inline]
    pub async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<TagWithCount>> {
        TagQueries::list_with_counts(&self.pool, category).await
    }
}
