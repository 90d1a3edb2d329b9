use super::*;

#[test]
fn mode_parsing_falls_back_to_hybrid() {
    assert_eq!(SearchMode::parse("semantic"), SearchMode::Semantic);
    assert_eq!(SearchMode::parse("keyword"), SearchMode::Keyword);
    assert_eq!(SearchMode::parse("hybrid"), SearchMode::Hybrid);
    assert_eq!(SearchMode::parse("fuzzy"), SearchMode::Hybrid);
    assert_eq!(SearchMode::parse(""), SearchMode::Hybrid);
}

#[test]
fn fusion_weights_components() {
    // Keyword-only candidate at default weight: relevance = 0.4 * k.
    let relevance = fuse_scores(0.0, 0.8, 0.6);
    assert!((relevance - 0.32).abs() < 1e-12);

    // Semantic-only candidate: relevance = 0.6 * s.
    let relevance = fuse_scores(0.5, 0.0, 0.6);
    assert!((relevance - 0.3).abs() < 1e-12);

    // Both present.
    let relevance = fuse_scores(1.0, 1.0, 0.6);
    assert!((relevance - 1.0).abs() < 1e-12);
}

#[test]
fn fusion_respects_configured_weight() {
    assert!((fuse_scores(1.0, 0.0, 1.0) - 1.0).abs() < 1e-12);
    assert!((fuse_scores(1.0, 0.0, 0.0)).abs() < 1e-12);
    assert!((fuse_scores(0.0, 1.0, 0.0) - 1.0).abs() < 1e-12);
}

#[test]
fn score_rounding_is_four_decimals() {
    assert!((round_score(0.123_456_789) - 0.1235).abs() < 1e-12);
    assert!((round_score(0.999_96) - 1.0).abs() < 1e-12);
    assert!((round_score(0.0)).abs() < 1e-12);
}

#[test]
fn short_problem_text_is_untouched() {
    assert_eq!(truncate_problem("short problem"), "short problem");

    let exactly_200: String = "x".repeat(200);
    assert_eq!(truncate_problem(&exactly_200), exactly_200);
}

#[test]
fn long_problem_text_is_cut_with_ellipsis() {
    let long: String = "y".repeat(250);
    let truncated = truncate_problem(&long);
    assert_eq!(truncated.chars().count(), 203);
    assert!(truncated.ends_with("..."));
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let long: String = "é".repeat(250);
    let truncated = truncate_problem(&long);
    assert_eq!(truncated.chars().count(), 203);
}

#[test]
fn candidates_order_by_relevance_then_id() {
    let make = |id: &str, relevance: f64| SearchCandidate {
        solution_id: id.to_string(),
        semantic_score: 0.0,
        keyword_score: 0.0,
        relevance,
    };

    let mut candidates = vec![make("c", 0.5), make("a", 0.5), make("b", 0.9)];
    candidates.sort_by(compare_candidates);

    let ids: Vec<&str> = candidates.iter().map(|c| c.solution_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn negative_semantic_scores_sort_last() {
    let make = |id: &str, relevance: f64| SearchCandidate {
        solution_id: id.to_string(),
        semantic_score: relevance,
        keyword_score: 0.0,
        relevance,
    };

    let mut candidates = vec![make("low", -0.2), make("high", 0.7)];
    candidates.sort_by(compare_candidates);
    assert_eq!(candidates[0].solution_id, "high");
}
