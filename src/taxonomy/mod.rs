//! Tag taxonomy
//!
//! Incoming tags are free text; classifying them into a small set of fixed
//! categories gives browsing and filtering a stable structure without
//! requiring callers to categorize tags themselves.


use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Category assigned to every tag. Fixed at first registration; never
/// re-inferred for an existing tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    TechStack,
    ProblemType,
    ErrorCode,
}

impl std::fmt::Display for TagCategory {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            TagCategory::TechStack => write!(f, "tech_stack"),
            TagCategory::ProblemType => write!(f, "problem_type"),
            TagCategory::ErrorCode => write!(f, "error_code"),
        }
    }
}

impl std::str::FromStr for TagCategory {
    type Err = UnknownCategory;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tech_stack" => Ok(TagCategory::TechStack),
            "problem_type" => Ok(TagCategory::ProblemType),
            "error_code" => Ok(TagCategory::ErrorCode),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid category: {0}. Must be one of: tech_stack, problem_type, error_code")]
pub struct UnknownCategory(pub String);

/// Technology and tooling names that mark a tag as `tech_stack`.
/// Fixed data, matched as substrings of the lowercased tag name.
const TECH_KEYWORDS: &[&str] = &[
    "react",
    "vue",
    "angular",
    "node",
    "python",
    "java",
    "go",
    "rust",
    "docker",
    "kubernetes",
    "aws",
    "gcp",
    "azure",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "typescript",
    "javascript",
    "css",
    "html",
];

/// Substrings that mark a tag as `error_code`.
const ERROR_MARKERS: &[&str] = &["error", "exception", "fail", "http", "status", "code"];

/// Classify a free-form tag name into its category.
///
/// Deterministic and case-insensitive. Rules are checked in precedence
/// order: technology keywords win over error markers, and anything matching
/// neither (and not all digits) is a `problem_type`.
#[inline]
pub fn classify(tag_name: &str) -> TagCategory {
    let lowered = tag_name.to_lowercase();

    if TECH_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        TagCategory::TechStack
    } else if ERROR_MARKERS.iter().any(|marker| lowered.contains(marker))
        || (!tag_name.is_empty() && tag_name.chars().all(|c| c.is_ascii_digit()))
    {
        TagCategory::ErrorCode
    } else {
        TagCategory::ProblemType
    }
}
