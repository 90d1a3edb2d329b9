use super::*;
use crate::database::sqlite::models::NewSolution;
use anyhow::Result;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_data_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

fn sample_solution() -> Solution {
    Solution::create(NewSolution {
        title: "Docker Network Issue".to_string(),
        problem: "ECONNREFUSED when connecting to container".to_string(),
        solution: "Fix network configuration".to_string(),
        root_cause: Some("Wrong bridge network".to_string()),
        error_messages: vec!["ECONNREFUSED 127.0.0.1:5432".to_string()],
        tags: vec!["Docker".to_string(), "bug".to_string()],
        project_name: Some("api-server".to_string()),
    })
}

#[tokio::test]
async fn schema_contains_expected_tables() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(database.pool())
    .await?;

    for expected in ["solutions", "tags", "solution_tags", "solutions_fts"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, got {tables:?}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn save_and_get_round_trip() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let solution = sample_solution();
    database.save_solution(&solution).await?;

    let retrieved = database
        .get_solution(&solution.id)
        .await?
        .expect("should find saved solution");

    assert_eq!(retrieved.title, solution.title);
    assert_eq!(retrieved.problem, solution.problem);
    assert_eq!(retrieved.solution, solution.solution);
    assert_eq!(retrieved.root_cause, solution.root_cause);
    assert_eq!(retrieved.error_messages, solution.error_messages);
    assert_eq!(retrieved.project_name, solution.project_name);
    assert!(retrieved.tags.contains(&"Docker".to_string()));
    assert!(retrieved.tags.contains(&"bug".to_string()));

    Ok(())
}

#[tokio::test]
async fn get_unknown_id_returns_none() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let result = database.get_solution("no-such-id").await?;
    assert!(result.is_none());

    Ok(())
}

#[tokio::test]
async fn keyword_search_finds_saved_record_immediately() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let docker = sample_solution();
    let react = Solution::create(NewSolution {
        title: "React State Bug".to_string(),
        problem: "Component not re-rendering on state change".to_string(),
        solution: "Use useEffect hook".to_string(),
        ..NewSolution::default()
    });
    database.save_solution(&docker).await?;
    database.save_solution(&react).await?;

    let results = database.search_keyword("Docker ECONNREFUSED", 10).await?;
    assert!(!results.is_empty());
    assert!(results.iter().any(|(id, _)| *id == docker.id));

    // Best hit always normalizes to 1.0.
    let best = results
        .iter()
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!((best - 1.0).abs() < 1e-9);
    assert!(results.iter().all(|(_, score)| *score > 0.0 && *score <= 1.0));

    Ok(())
}

#[tokio::test]
async fn keyword_search_on_empty_index_returns_empty() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let results = database.search_keyword("anything", 10).await?;
    assert!(results.is_empty());

    Ok(())
}

#[tokio::test]
async fn malformed_fts_query_returns_empty_not_error() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;
    database.save_solution(&sample_solution()).await?;

    // Unbalanced quote is invalid FTS5 syntax.
    let results = database.search_keyword("\"unbalanced", 10).await?;
    assert!(results.is_empty());

    Ok(())
}

#[tokio::test]
async fn delete_removes_record_index_entries_and_links() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let solution = sample_solution();
    database.save_solution(&solution).await?;

    assert!(database.delete_solution(&solution.id).await?);

    assert!(database.get_solution(&solution.id).await?.is_none());
    let results = database.search_keyword("Docker ECONNREFUSED", 10).await?;
    assert!(!results.iter().any(|(id, _)| *id == solution.id));

    // Tag rows persist even when the last record referencing them is gone.
    let tags = database.list_tags(None).await?;
    let docker = tags
        .iter()
        .find(|t| t.name == "Docker")
        .expect("tag should persist after delete");
    assert_eq!(docker.count, 0);

    Ok(())
}

#[tokio::test]
async fn delete_missing_record_returns_false() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    assert!(!database.delete_solution("no-such-id").await?);

    Ok(())
}

#[tokio::test]
async fn tag_category_is_not_reinferred_for_existing_name() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let first = Solution::create(NewSolution {
        title: "First".to_string(),
        problem: "p".to_string(),
        solution: "s".to_string(),
        tags: vec!["flaky".to_string()],
        ..NewSolution::default()
    });
    database.save_solution(&first).await?;

    // Force a different category into the table, then re-register the name.
    sqlx::query("UPDATE tags SET category = 'error_code' WHERE name = 'flaky'")
        .execute(database.pool())
        .await?;

    let second = Solution::create(NewSolution {
        title: "Second".to_string(),
        problem: "p".to_string(),
        solution: "s".to_string(),
        tags: vec!["flaky".to_string()],
        ..NewSolution::default()
    });
    database.save_solution(&second).await?;

    let tags = database.list_tags(None).await?;
    let flaky = tags
        .iter()
        .find(|t| t.name == "flaky")
        .expect("tag should exist");
    assert_eq!(flaky.category, TagCategory::ErrorCode);
    assert_eq!(flaky.count, 2);

    Ok(())
}

#[tokio::test]
async fn list_tags_filters_by_category_and_orders_by_count() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    for (title, tags) in [
        ("a", vec!["Python", "bug"]),
        ("b", vec!["Python", "Docker"]),
        ("c", vec!["Python"]),
    ] {
        let solution = Solution::create(NewSolution {
            title: title.to_string(),
            problem: "p".to_string(),
            solution: "s".to_string(),
            tags: tags.into_iter().map(String::from).collect(),
            ..NewSolution::default()
        });
        database.save_solution(&solution).await?;
    }

    let tech = database.list_tags(Some(TagCategory::TechStack)).await?;
    let names: Vec<&str> = tech.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Python"));
    assert!(names.contains(&"Docker"));
    assert!(!names.contains(&"bug"));

    assert_eq!(tech[0].name, "Python");
    assert_eq!(tech[0].count, 3);

    let counts: Vec<i64> = tech.iter().map(|t| t.count).collect();
    let mut sorted = counts.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(counts, sorted);

    Ok(())
}

#[tokio::test]
async fn duplicate_tags_in_input_are_deduplicated() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let solution = Solution::create(NewSolution {
        title: "dup".to_string(),
        problem: "p".to_string(),
        solution: "s".to_string(),
        tags: vec!["Docker".to_string(), "Docker".to_string()],
        ..NewSolution::default()
    });
    database.save_solution(&solution).await?;

    let retrieved = database
        .get_solution(&solution.id)
        .await?
        .expect("should find saved solution");
    assert_eq!(retrieved.tags, vec!["Docker".to_string()]);

    Ok(())
}

#[tokio::test]
async fn get_many_skips_missing_ids() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let solution = sample_solution();
    database.save_solution(&solution).await?;

    let ids = vec![solution.id.clone(), "missing-id".to_string()];
    let found = database.get_solutions_by_ids(&ids).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, solution.id);

    Ok(())
}
