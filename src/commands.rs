use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{Config, get_data_dir};
use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::Database;
use crate::embeddings::ollama::OllamaClient;
use crate::mcp::McpServer;
use crate::mcp::tools::{
    GetSolutionHandler, ListTagsHandler, SaveSolutionHandler, SearchSolutionsHandler,
};
use crate::reconcile::Reconciler;
use crate::search::HybridSearchEngine;

fn load_config() -> Result<Config> {
    let data_dir = get_data_dir().context("Failed to determine data directory")?;
    Config::load(&data_dir).context("Failed to load configuration")
}

async fn init_stores(config: &Config) -> Result<(Arc<Database>, Arc<VectorStore>)> {
    let database = Arc::new(
        Database::initialize_from_data_dir(config.get_base_dir())
            .await
            .context("Failed to initialize SQLite database")?,
    );

    let vector_store = Arc::new(
        VectorStore::new(config)
            .await
            .context("Failed to initialize vector store")?,
    );

    Ok((database, vector_store))
}

/// Start the MCP server on stdio
#[inline]
pub async fn serve_mcp() -> Result<()> {
    let config = load_config()?;

    // Verify Ollama connectivity before accepting requests. A degraded
    // backend still serves keyword search, so this only warns.
    match OllamaClient::new(config.ollama.clone()) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                info!(
                    "Ollama connected at {}:{} with model {}",
                    config.ollama.host, config.ollama.port, config.ollama.model
                );
            }
            Err(e) => {
                warn!("Ollama is unhealthy, semantic indexing may fail: {}", e);
                eprintln!("Warning: Ollama may not be ready. Semantic search may fail.");
                eprintln!("Use 'solution-memory-mcp config' to update connection settings.");
            }
        },
        Err(e) => {
            error!("Failed to create Ollama client: {}", e);
            return Err(e);
        }
    }

    let (database, vector_store) = init_stores(&config).await?;

    let search_engine = Arc::new(HybridSearchEngine::new(
        Arc::clone(&database),
        Arc::clone(&vector_store),
        config.search.semantic_weight,
    ));

    let server = Arc::new(McpServer::new(
        "solution-memory-mcp".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    ));

    server
        .register_tool(
            SaveSolutionHandler::tool_definition(),
            SaveSolutionHandler::new(Arc::clone(&database), Arc::clone(&vector_store)),
        )
        .await;
    server
        .register_tool(
            SearchSolutionsHandler::tool_definition(),
            SearchSolutionsHandler::new(Arc::clone(&search_engine)),
        )
        .await;
    server
        .register_tool(
            GetSolutionHandler::tool_definition(),
            GetSolutionHandler::new(Arc::clone(&database)),
        )
        .await;
    server
        .register_tool(
            ListTagsHandler::tool_definition(),
            ListTagsHandler::new(Arc::clone(&database)),
        )
        .await;

    info!("MCP server initialized with tools: save_solution, search_solutions, get_solution, list_tags");
    eprintln!("Solution memory MCP server listening on stdio. Press Ctrl+C to stop.");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result.context("MCP server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nReceived interrupt signal, shutting down...");
        }
    }

    eprintln!("Shutdown complete");
    Ok(())
}

/// Show connectivity and store status
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("Solution Memory Status");
    println!("{}", "=".repeat(50));
    println!();

    println!("Database Status:");
    let database = match Database::initialize_from_data_dir(config.get_base_dir()).await {
        Ok(db) => {
            println!("  SQLite: Connected");
            Some(db)
        }
        Err(e) => {
            println!("  SQLite: Failed to connect - {}", e);
            None
        }
    };

    if let Some(database) = &database {
        match database.count_solutions().await {
            Ok(count) => println!("  Stored solutions: {}", count),
            Err(e) => println!("  Stored solutions: Error - {}", e),
        }
    }

    println!();
    println!("Ollama Status:");
    match OllamaClient::new(config.ollama.clone()) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "  Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("  Model: {}", config.ollama.model);
            }
            Err(e) => {
                println!("  Ollama: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("  Ollama: Failed to connect - {}", e);
        }
    }

    println!();
    println!("Vector Database Status:");
    let vector_store = match VectorStore::new(&config).await {
        Ok(store) => {
            println!("  LanceDB: Connected");
            match store.count().await {
                Ok(count) => println!("  Indexed embeddings: {}", count),
                Err(e) => println!("  Indexed embeddings: Error - {}", e),
            }
            Some(store)
        }
        Err(e) => {
            println!("  LanceDB: Failed to connect - {}", e);
            None
        }
    };

    if let (Some(database), Some(vector_store)) = (&database, &vector_store) {
        println!();
        println!("Store Consistency:");
        match Reconciler::new(database, vector_store).check().await {
            Ok(report) => {
                println!("  {}", report.summary());
                if !report.is_consistent {
                    println!("  Run 'solution-memory-mcp reconcile' to repair.");
                }
            }
            Err(e) => {
                println!("  Failed to check consistency: {}", e);
            }
        }
    }

    println!();
    println!("Next Steps:");
    println!("  - Use 'solution-memory-mcp serve' to start the MCP server");
    println!("  - Use 'solution-memory-mcp config' to adjust settings");

    Ok(())
}

/// Repair drift between the keyword store and the vector index
#[inline]
pub async fn reconcile() -> Result<()> {
    let config = load_config()?;
    let (database, vector_store) = init_stores(&config).await?;

    let reconciler = Reconciler::new(&database, &vector_store);

    let report = reconciler.check().await?;
    println!("{}", report.summary());

    if report.is_consistent {
        return Ok(());
    }

    let outcome = reconciler.repair().await?;
    println!(
        "Repair complete: {} re-embedded, {} orphaned embeddings removed, {} failed",
        outcome.reindexed, outcome.removed, outcome.failed
    );

    if outcome.failed > 0 {
        println!("Some records could not be repaired; check that Ollama is running.");
    }

    Ok(())
}

/// Delete a record from both stores
#[inline]
pub async fn delete_solution(id: String) -> Result<()> {
    let config = load_config()?;
    let (database, vector_store) = init_stores(&config).await?;

    let existed = database.delete_solution(&id).await?;
    if !existed {
        println!("No solution found with ID {}", id);
        return Ok(());
    }

    if vector_store.delete(&id).await {
        println!("Deleted solution {}", id);
    } else {
        println!(
            "Deleted solution {} from the keyword store, but removing its embedding failed. \
             Run 'solution-memory-mcp reconcile' to clean up.",
            id
        );
    }

    Ok(())
}
