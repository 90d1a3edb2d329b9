use clap::{Parser, Subcommand};
use solution_memory_mcp::Result;
use solution_memory_mcp::commands::{delete_solution, reconcile, serve_mcp, show_status};
use solution_memory_mcp::config::{get_data_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "solution-memory-mcp")]
#[command(about = "Problem/solution memory with hybrid keyword + semantic search over MCP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding backend and search settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start MCP server on stdio
    Serve,
    /// Show connectivity, store counts, and index consistency
    Status,
    /// Repair drift between the keyword store and the vector index
    Reconcile,
    /// Delete a solution from both stores
    Delete {
        /// Solution ID to delete
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the MCP stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            let data_dir = get_data_dir().map_err(anyhow::Error::from)?;
            if show {
                show_config(&data_dir)?;
            } else {
                run_interactive_config(&data_dir)?;
            }
        }
        Commands::Serve => {
            serve_mcp().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Reconcile => {
            reconcile().await?;
        }
        Commands::Delete { id } => {
            delete_solution(id).await?;
        }
    }

    Ok(())
}
