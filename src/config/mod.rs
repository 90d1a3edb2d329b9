// Configuration management module
// Handles the TOML configuration file under the solution-memory data directory

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, OllamaConfig, SearchConfig};

/// Environment variable overriding the data directory location
pub const DATA_DIR_ENV: &str = "SOLUTION_MEMORY_PATH";

/// Get the data directory holding the config file and both stores
#[inline]
pub fn get_data_dir() -> Result<std::path::PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(std::path::PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(".solution-memory"))
        .ok_or(ConfigError::DirectoryError)
}
