
use super::models::{Solution, TagWithCount};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::taxonomy::{self, TagCategory};

/// Canonical row shape of the `solutions` table. Tags live in the junction
/// table and error messages are JSON-encoded text.
#[derive(Debug, FromRow)]
struct SolutionRow {
    id: String,
    title: String,
    problem: String,
    solution: String,
    root_cause: Option<String>,
    error_messages: Option<String>,
    project_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SolutionRow {
    fn into_solution(self, tags: Vec<String>) -> Result<Solution> {
        let error_messages = match self.error_messages.as_deref() {
            Some(json) if !json.is_empty() => {
                serde_json::from_str(json).context("Failed to decode stored error messages")?
            }
            _ => Vec::new(),
        };

        Ok(Solution {
            id: self.id,
            title: self.title,
            problem: self.problem,
            solution: self.solution,
            root_cause: self.root_cause,
            error_messages,
            tags,
            project_name: self.project_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct SolutionQueries;

impl SolutionQueries {
    /// Insert the canonical row, its keyword-index entry, and its tag links
    /// in one transaction. A search issued right after this returns observes
    /// the new record; there is no asynchronous index catch-up.
    #[inline]
    pub async fn insert(pool: &SqlitePool, solution: &Solution) -> Result<()> {
        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for solution insert")?;

        let error_messages_json = serde_json::to_string(&solution.error_messages)
            .context("Failed to encode error messages")?;

        sqlx::query(
            r#"
            INSERT INTO solutions (id, title, problem, root_cause, solution, error_messages, project_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&solution.id)
        .bind(&solution.title)
        .bind(&solution.problem)
        .bind(&solution.root_cause)
        .bind(&solution.solution)
        .bind(&error_messages_json)
        .bind(&solution.project_name)
        .bind(solution.created_at)
        .bind(solution.updated_at)
        .execute(&mut *transaction)
        .await
        .context("Failed to insert solution")?;

        sqlx::query(
            r#"
            INSERT INTO solutions_fts (id, title, problem, solution, error_messages)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&solution.id)
        .bind(&solution.title)
        .bind(&solution.problem)
        .bind(&solution.solution)
        .bind(solution.error_messages.join(" "))
        .execute(&mut *transaction)
        .await
        .context("Failed to index solution for keyword search")?;

        for tag_name in &solution.tags {
            TagQueries::ensure_tag_and_link(&mut transaction, &solution.id, tag_name).await?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit solution insert transaction")?;

        debug!("Inserted solution {}", solution.id);
        Ok(())
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Solution>> {
        let row = sqlx::query_as::<_, SolutionRow>(
            r#"
            SELECT id,
                   title,
                   problem,
                   solution,
                   root_cause,
                   error_messages,
                   project_name,
                   created_at,
                   updated_at
            FROM solutions WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get solution by id")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = Self::tags_for(pool, id).await?;
        Ok(Some(row.into_solution(tags)?))
    }

    /// Fetch multiple records, silently skipping ids that no longer exist
    #[inline]
    pub async fn get_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Solution>> {
        let mut solutions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(solution) = Self::get_by_id(pool, id).await? {
                solutions.push(solution);
            }
        }
        Ok(solutions)
    }

    /// Ranked full-text match over title/problem/solution/error messages.
    ///
    /// Raw BM25 ranks (lower is better) are negated and divided by the
    /// largest negated value, so the best hit always scores 1.0 and the rest
    /// land in (0, 1]. A query FTS5 cannot parse yields no hits rather than
    /// an error.
    #[inline]
    pub async fn search_fts(
        pool: &SqlitePool,
        query: &str,
        limit: usize,
    ) -> Result<Vec<(String, f64)>> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            r#"
            SELECT id, bm25(solutions_fts) AS score
            FROM solutions_fts
            WHERE solutions_fts MATCH ?
            ORDER BY score
            LIMIT ?
            "#,
        )
        .bind(query)
        .bind(limit as i64)
        .fetch_all(pool)
        .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(sqlx::Error::Database(db_error)) => {
                debug!("FTS query rejected, returning no hits: {}", db_error);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e).context("Failed to run keyword search"),
        };

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let negated: Vec<(String, f64)> = rows
            .into_iter()
            .map(|(id, score)| (id, -score))
            .collect();

        let max_score = negated
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);

        let normalized = negated
            .into_iter()
            .map(|(id, score)| {
                if max_score > 0.0 {
                    (id, score / max_score)
                } else {
                    (id, 0.0)
                }
            })
            .collect();

        Ok(normalized)
    }

    /// Remove the canonical row, its keyword-index entry, and its tag links.
    /// Returns whether a row existed.
    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for solution delete")?;

        let result = sqlx::query("DELETE FROM solutions WHERE id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await
            .context("Failed to delete solution")?;

        sqlx::query("DELETE FROM solutions_fts WHERE id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await
            .context("Failed to remove solution from keyword index")?;

        transaction
            .commit()
            .await
            .context("Failed to commit solution delete transaction")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn list_ids(pool: &SqlitePool) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM solutions ORDER BY created_at")
            .fetch_all(pool)
            .await
            .context("Failed to list solution ids")?;

        Ok(ids)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM solutions")
            .fetch_one(pool)
            .await
            .context("Failed to count solutions")?;

        Ok(count)
    }

    async fn tags_for(pool: &SqlitePool, solution_id: &str) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name FROM tags t
            JOIN solution_tags st ON t.id = st.tag_id
            WHERE st.solution_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(solution_id)
        .fetch_all(pool)
        .await
        .context("Failed to get tags for solution")?;

        Ok(tags)
    }
}

pub struct TagQueries;

impl TagQueries {
    /// Register the tag if absent and link it to the record. Registration is
    /// idempotent: an existing name keeps its stored category even when
    /// reclassification would now yield a different one.
    #[inline]
    pub async fn ensure_tag_and_link(
        transaction: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        solution_id: &str,
        tag_name: &str,
    ) -> Result<()> {
        let category = taxonomy::classify(tag_name);

        sqlx::query("INSERT OR IGNORE INTO tags (name, category) VALUES (?, ?)")
            .bind(tag_name)
            .bind(category)
            .execute(&mut **transaction)
            .await
            .context("Failed to register tag")?;

        let tag_id = sqlx::query_scalar::<_, i64>("SELECT id FROM tags WHERE name = ?")
            .bind(tag_name)
            .fetch_one(&mut **transaction)
            .await
            .context("Failed to look up tag id")?;

        sqlx::query("INSERT OR IGNORE INTO solution_tags (solution_id, tag_id) VALUES (?, ?)")
            .bind(solution_id)
            .bind(tag_id)
            .execute(&mut **transaction)
            .await
            .context("Failed to link tag to solution")?;

        Ok(())
    }

    /// Keep ids associated with at least one of the given tag names (OR
    /// semantics). An empty tag list keeps every id.
    #[inline]
    pub async fn filter_by_tags(
        pool: &SqlitePool,
        solution_ids: &[String],
        tags: &[String],
    ) -> Result<Vec<String>> {
        if solution_ids.is_empty() || tags.is_empty() {
            return Ok(solution_ids.to_vec());
        }

        let id_placeholders = vec!["?"; solution_ids.len()].join(",");
        let tag_placeholders = vec!["?"; tags.len()].join(",");

        let query_str = format!(
            r#"
            SELECT DISTINCT st.solution_id
            FROM solution_tags st
            JOIN tags t ON st.tag_id = t.id
            WHERE st.solution_id IN ({id_placeholders})
            AND t.name IN ({tag_placeholders})
            "#
        );

        let mut query = sqlx::query_scalar::<_, String>(&query_str);
        for id in solution_ids {
            query = query.bind(id);
        }
        for tag in tags {
            query = query.bind(tag);
        }

        let ids = query
            .fetch_all(pool)
            .await
            .context("Failed to filter solutions by tags")?;

        Ok(ids)
    }

    /// Every tag with the count of records carrying it, most-used first
    #[inline]
    pub async fn list_with_counts(
        pool: &SqlitePool,
        category: Option<TagCategory>,
    ) -> Result<Vec<TagWithCount>> {
        let tags = if let Some(category) = category {
            sqlx::query_as::<_, TagWithCount>(
                r#"
                SELECT t.name, t.category, COUNT(st.solution_id) AS count
                FROM tags t
                LEFT JOIN solution_tags st ON t.id = st.tag_id
                WHERE t.category = ?
                GROUP BY t.id
                ORDER BY count DESC
                "#,
            )
            .bind(category)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, TagWithCount>(
                r#"
                SELECT t.name, t.category, COUNT(st.solution_id) AS count
                FROM tags t
                LEFT JOIN solution_tags st ON t.id = st.tag_id
                GROUP BY t.id
                ORDER BY count DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
        .context("Failed to list tags")?;

        Ok(tags)
    }
}
