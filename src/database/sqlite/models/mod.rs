
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::taxonomy::TagCategory;

/// A stored problem/solution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: String,
    pub title: String,
    pub problem: String,
    pub solution: String,
    pub root_cause: Option<String>,
    pub error_messages: Vec<String>,
    pub tags: Vec<String>,
    pub project_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new record. The id and timestamps are assigned at
/// creation and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NewSolution {
    pub title: String,
    pub problem: String,
    pub solution: String,
    pub root_cause: Option<String>,
    pub error_messages: Vec<String>,
    pub tags: Vec<String>,
    pub project_name: Option<String>,
}

impl Solution {
    #[inline]
    pub fn create(new: NewSolution) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            problem: new.problem,
            solution: new.solution,
            root_cause: new.root_cause,
            error_messages: new.error_messages,
            tags: new.tags,
            project_name: new.project_name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A tag together with the number of records carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagWithCount {
    pub name: String,
    pub category: TagCategory,
    pub count: i64,
}

/// Lightweight view of a record returned from search, with per-index scores
/// and the fused relevance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub id: String,
    pub title: String,
    pub problem: String,
    pub relevance: f64,
    pub semantic_score: f64,
    pub keyword_score: f64,
    pub project_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}
