//! Hybrid search engine
//!
//! Fuses the keyword (FTS5/BM25) and semantic (vector) rankings into one
//! deterministic, tag-filtered, size-limited result list.

#[cfg(test)]
mod tests;

use anyhow::Result;
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::SolutionSummary;

/// How many characters of the problem text a summary carries
const SUMMARY_PROBLEM_CHARS: usize = 200;

/// Which index(es) a query consults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Hybrid,
    Semantic,
    Keyword,
}

impl SearchMode {
    /// Parse a mode string; anything unrecognized falls back to hybrid
    #[inline]
    pub fn parse(mode: &str) -> Self {
        match mode {
            "semantic" => SearchMode::Semantic,
            "keyword" => SearchMode::Keyword,
            _ => SearchMode::Hybrid,
        }
    }
}

impl std::fmt::Display for SearchMode {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SearchMode::Hybrid => write!(f, "hybrid"),
            SearchMode::Semantic => write!(f, "semantic"),
            SearchMode::Keyword => write!(f, "keyword"),
        }
    }
}

/// A record id surfaced by one or both indexes for a query, with its
/// per-index scores and fused relevance. Built per query, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub solution_id: String,
    pub semantic_score: f64,
    pub keyword_score: f64,
    pub relevance: f64,
}

/// Weighted combination of the two index scores. A candidate missing from
/// one index contributes 0 for that component.
#[inline]
pub fn fuse_scores(semantic_score: f64, keyword_score: f64, semantic_weight: f64) -> f64 {
    semantic_weight * semantic_score + (1.0 - semantic_weight) * keyword_score
}

/// Round a score to 4 decimal places for presentation
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Truncate problem text for a summary, marking the cut with an ellipsis
#[inline]
pub fn truncate_problem(problem: &str) -> String {
    if problem.chars().count() <= SUMMARY_PROBLEM_CHARS {
        problem.to_string()
    } else {
        let mut truncated: String = problem.chars().take(SUMMARY_PROBLEM_CHARS).collect();
        truncated.push_str("...");
        truncated
    }
}

/// Orders candidates by fused relevance, best first. Equal relevance is
/// broken by record id ascending so rankings are reproducible.
#[inline]
pub fn compare_candidates(a: &SearchCandidate, b: &SearchCandidate) -> Ordering {
    b.relevance
        .partial_cmp(&a.relevance)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.solution_id.cmp(&b.solution_id))
}

pub struct HybridSearchEngine {
    database: Arc<Database>,
    vector_store: Arc<VectorStore>,
    semantic_weight: f64,
}

impl HybridSearchEngine {
    #[inline]
    pub fn new(
        database: Arc<Database>,
        vector_store: Arc<VectorStore>,
        semantic_weight: f64,
    ) -> Self {
        Self {
            database,
            vector_store,
            semantic_weight,
        }
    }

    #[inline]
    pub fn semantic_weight(&self) -> f64 {
        self.semantic_weight
    }

    /// Run a query against the selected index(es) and return ranked
    /// summaries.
    ///
    /// Candidates are over-fetched at twice the limit to leave headroom for
    /// tag filtering. Either index being empty contributes zero candidates
    /// rather than an error.
    #[inline]
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        tags: &[String],
        mode: SearchMode,
    ) -> Result<Vec<SolutionSummary>> {
        let fetch_limit = limit * 2;

        let mut candidates = match mode {
            SearchMode::Semantic => self.semantic_candidates(query, fetch_limit).await?,
            SearchMode::Keyword => self.keyword_candidates(query, fetch_limit).await?,
            SearchMode::Hybrid => self.hybrid_candidates(query, fetch_limit).await?,
        };

        debug!(
            "Search mode {} produced {} candidates for query",
            mode,
            candidates.len()
        );

        if !tags.is_empty() && !candidates.is_empty() {
            let candidate_ids: Vec<String> = candidates
                .iter()
                .map(|c| c.solution_id.clone())
                .collect();
            let kept: HashSet<String> = self
                .database
                .filter_by_tags(&candidate_ids, tags)
                .await?
                .into_iter()
                .collect();
            candidates.retain(|c| kept.contains(&c.solution_id));
        }

        let ranked: Vec<SearchCandidate> = candidates
            .into_iter()
            .sorted_by(compare_candidates)
            .take(limit)
            .collect();

        self.to_summaries(&ranked).await
    }

    async fn hybrid_candidates(
        &self,
        query: &str,
        fetch_limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        let semantic: HashMap<String, f64> = self
            .vector_store
            .search(query, fetch_limit)
            .await?
            .into_iter()
            .map(|(id, score)| (id, f64::from(score)))
            .collect();
        let keyword: HashMap<String, f64> = self
            .database
            .search_keyword(query, fetch_limit)
            .await?
            .into_iter()
            .collect();

        let all_ids: HashSet<&String> = semantic.keys().chain(keyword.keys()).collect();

        let candidates = all_ids
            .into_iter()
            .map(|id| {
                let semantic_score = semantic.get(id).copied().unwrap_or(0.0);
                let keyword_score = keyword.get(id).copied().unwrap_or(0.0);
                SearchCandidate {
                    solution_id: id.clone(),
                    semantic_score,
                    keyword_score,
                    relevance: fuse_scores(semantic_score, keyword_score, self.semantic_weight),
                }
            })
            .collect();

        Ok(candidates)
    }

    async fn semantic_candidates(
        &self,
        query: &str,
        fetch_limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        let results = self.vector_store.search(query, fetch_limit).await?;

        Ok(results
            .into_iter()
            .map(|(id, score)| SearchCandidate {
                solution_id: id,
                semantic_score: f64::from(score),
                keyword_score: 0.0,
                relevance: f64::from(score),
            })
            .collect())
    }

    async fn keyword_candidates(
        &self,
        query: &str,
        fetch_limit: usize,
    ) -> Result<Vec<SearchCandidate>> {
        let results = self.database.search_keyword(query, fetch_limit).await?;

        Ok(results
            .into_iter()
            .map(|(id, score)| SearchCandidate {
                solution_id: id,
                semantic_score: 0.0,
                keyword_score: score,
                relevance: score,
            })
            .collect())
    }

    /// Materialize candidates into summaries. A candidate whose canonical
    /// record has vanished (index drift) is dropped, not reported.
    async fn to_summaries(&self, candidates: &[SearchCandidate]) -> Result<Vec<SolutionSummary>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.solution_id.clone()).collect();
        let solutions = self.database.get_solutions_by_ids(&ids).await?;
        let by_id: HashMap<&str, _> = solutions.iter().map(|s| (s.id.as_str(), s)).collect();

        let summaries = candidates
            .iter()
            .filter_map(|candidate| {
                by_id.get(candidate.solution_id.as_str()).map(|solution| {
                    SolutionSummary {
                        id: solution.id.clone(),
                        title: solution.title.clone(),
                        problem: truncate_problem(&solution.problem),
                        relevance: round_score(candidate.relevance),
                        semantic_score: round_score(candidate.semantic_score),
                        keyword_score: round_score(candidate.keyword_score),
                        project_name: solution.project_name.clone(),
                        created_at: solution.created_at,
                        tags: solution.tags.clone(),
                    }
                })
            })
            .collect();

        Ok(summaries)
    }
}
