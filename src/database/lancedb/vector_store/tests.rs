use super::*;
use crate::config::{OllamaConfig, SearchConfig};
use tempfile::TempDir;

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        ollama: OllamaConfig::default(),
        search: SearchConfig::default(),
        base_dir: temp_dir.path().to_path_buf(),
    }
}

#[tokio::test]
async fn new_store_is_empty() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let store = VectorStore::new(&test_config(&temp_dir))
        .await
        .expect("should create vector store successfully");

    assert_eq!(store.count().await.expect("should count rows"), 0);
    assert!(store.list_ids().await.expect("should list ids").is_empty());
}

#[tokio::test]
async fn search_on_empty_index_skips_engine_and_embedder() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let store = VectorStore::new(&test_config(&temp_dir))
        .await
        .expect("should create vector store successfully");

    // No Ollama server is running in tests; an empty index must return
    // before any embedding request is attempted.
    let results = store
        .search("network connection refused", 5)
        .await
        .expect("should search empty index successfully");
    assert!(results.is_empty());
}

#[tokio::test]
async fn reopening_store_preserves_table() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = test_config(&temp_dir);

    {
        let _store = VectorStore::new(&config)
            .await
            .expect("should create vector store successfully");
    }

    let reopened = VectorStore::new(&config)
        .await
        .expect("should reopen vector store successfully");
    assert_eq!(reopened.count().await.expect("should count rows"), 0);
}

#[tokio::test]
async fn delete_on_missing_id_does_not_error() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let store = VectorStore::new(&test_config(&temp_dir))
        .await
        .expect("should create vector store successfully");

    // Nothing matches the predicate; the call still reports success.
    assert!(store.delete("no-such-id").await);
}
