// LanceDB vector database module
// Handles embedding storage and cosine-similarity search for records

pub mod vector_store;

use serde::{Deserialize, Serialize};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Record id; matches the id of the canonical SQLite row
    pub id: String,
    /// The vector embedding of the record's derived document
    pub vector: Vec<f32>,
    /// Metadata stored alongside the vector
    pub metadata: SolutionMetadata,
}

/// Lightweight metadata kept with each embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionMetadata {
    pub solution_id: String,
    pub title: String,
}

/// Build the text that gets embedded for a record.
///
/// Identical at write time and on any recompute, so re-adding the same
/// inputs always yields the same embedded text.
#[inline]
pub fn embedding_document(problem: &str, error_messages: &[String]) -> String {
    if error_messages.is_empty() {
        problem.to_string()
    } else {
        format!(
            "{} Error messages: {}",
            problem,
            error_messages.join(" | ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_errors_is_problem_only() {
        assert_eq!(embedding_document("it broke", &[]), "it broke");
    }

    #[test]
    fn document_with_errors_appends_joined_messages() {
        let messages = vec!["E1".to_string(), "E2".to_string()];
        assert_eq!(
            embedding_document("it broke", &messages),
            "it broke Error messages: E1 | E2"
        );
    }

    #[test]
    fn document_derivation_is_deterministic() {
        let messages = vec!["timeout".to_string()];
        let a = embedding_document("same problem", &messages);
        let b = embedding_document("same problem", &messages);
        assert_eq!(a, b);
    }
}
