use super::*;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config {
        ollama: OllamaConfig::default(),
        search: SearchConfig::default(),
        base_dir: PathBuf::new(),
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert!((config.search.semantic_weight - 0.6).abs() < f64::EPSILON);
}

#[test]
fn ollama_validation() {
    let config = OllamaConfig::default();
    assert!(config.validate().is_ok());

    let mut invalid = config.clone();
    invalid.port = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = config.clone();
    invalid.model = String::new();
    assert!(invalid.validate().is_err());

    let mut invalid = config.clone();
    invalid.batch_size = 1001;
    assert!(invalid.validate().is_err());

    let mut invalid = config.clone();
    invalid.protocol = "ftp".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = config;
    invalid.embedding_dimension = 32;
    assert!(invalid.validate().is_err());
}

#[test]
fn semantic_weight_bounds() {
    let mut search = SearchConfig::default();
    assert!(search.validate().is_ok());

    search.semantic_weight = 0.0;
    assert!(search.validate().is_ok());
    search.semantic_weight = 1.0;
    assert!(search.validate().is_ok());

    search.semantic_weight = -0.1;
    assert!(search.validate().is_err());
    search.semantic_weight = 1.5;
    assert!(search.validate().is_err());
    search.semantic_weight = f64::NAN;
    assert!(search.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = OllamaConfig::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::load(temp_dir.path()).expect("should load config successfully");
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.search, SearchConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let mut config = Config::load(temp_dir.path()).expect("should load config successfully");
    config.ollama.host = "embeddings.local".to_string();
    config.search.semantic_weight = 0.75;
    config.save().expect("should save config successfully");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config successfully");
    assert_eq!(reloaded.ollama.host, "embeddings.local");
    assert!((reloaded.search.semantic_weight - 0.75).abs() < f64::EPSILON);
}

#[test]
fn data_paths_live_under_base_dir() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::load(temp_dir.path()).expect("should load config successfully");

    assert_eq!(config.database_path(), temp_dir.path().join("solutions.db"));
    assert_eq!(
        config.vector_database_path(),
        temp_dir.path().join("vectors")
    );
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());

    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
}
