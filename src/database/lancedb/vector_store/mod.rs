#[cfg(test)]
mod tests;

use super::{EmbeddingRecord, SolutionMetadata, embedding_document};
use crate::config::Config;
use crate::embeddings::ollama::OllamaClient;
use crate::MemoryError;
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Vector index over one embedding per record, queried by cosine similarity
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    embedder: OllamaClient,
    vector_dimension: usize,
}

impl VectorStore {
    /// Connect to (or create) the vector database under the configured data
    /// directory
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, MemoryError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Database(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let embedder = OllamaClient::new(config.ollama.clone())
            .map_err(|e| MemoryError::Embedding(format!("Failed to create Ollama client: {}", e)))?;

        let store = Self {
            connection,
            table_name: "embeddings".to_string(),
            embedder,
            vector_dimension: config.ollama.embedding_dimension as usize,
        };

        store.initialize_table().await?;

        info!("Vector store initialized successfully");
        Ok(store)
    }

    /// Create the embeddings table if it does not exist yet
    async fn initialize_table(&self) -> Result<(), MemoryError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            debug!("Embeddings table already exists");
            return Ok(());
        }

        info!(
            "Creating embeddings table with {} dimensions",
            self.vector_dimension
        );

        let schema = self.create_schema();
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("solution_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
        ]))
    }

    async fn open_table(&self) -> Result<Table, MemoryError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to open table: {}", e)))
    }

    /// Embed the record's derived document and store it keyed by id.
    ///
    /// Not idempotent: adding the same id twice stores two entries. Callers
    /// re-indexing an existing record use `update` instead.
    #[inline]
    pub async fn add(
        &self,
        id: &str,
        problem: &str,
        error_messages: &[String],
        title: &str,
    ) -> Result<(), MemoryError> {
        let record = self.embed_record(id, problem, error_messages, title)?;
        self.insert_record(record).await
    }

    /// Re-embed and replace the stored vector and metadata for an id
    #[inline]
    pub async fn update(
        &self,
        id: &str,
        problem: &str,
        error_messages: &[String],
        title: &str,
    ) -> Result<(), MemoryError> {
        let record = self.embed_record(id, problem, error_messages, title)?;
        self.delete(id).await;
        self.insert_record(record).await
    }

    fn embed_record(
        &self,
        id: &str,
        problem: &str,
        error_messages: &[String],
        title: &str,
    ) -> Result<EmbeddingRecord, MemoryError> {
        let document = embedding_document(problem, error_messages);

        let result = self
            .embedder
            .generate_embedding(&document)
            .map_err(|e| MemoryError::Embedding(format!("Failed to embed document: {}", e)))?;

        if result.embedding.len() != self.vector_dimension {
            return Err(MemoryError::Embedding(format!(
                "Embedding backend returned {} dimensions, expected {}",
                result.embedding.len(),
                self.vector_dimension
            )));
        }

        Ok(EmbeddingRecord {
            id: id.to_string(),
            vector: result.embedding,
            metadata: SolutionMetadata {
                solution_id: id.to_string(),
                title: title.to_string(),
            },
        })
    }

    async fn insert_record(&self, record: EmbeddingRecord) -> Result<(), MemoryError> {
        let record_batch = self.create_record_batch(&record)?;
        let table = self.open_table().await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to insert embedding: {}", e)))?;

        debug!("Stored embedding for record {}", record.id);
        Ok(())
    }

    fn create_record_batch(&self, record: &EmbeddingRecord) -> Result<RecordBatch, MemoryError> {
        let schema = self.create_schema();

        let values_array = Float32Array::from(record.vector.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| MemoryError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![record.id.as_str()])),
            Arc::new(vector_array),
            Arc::new(StringArray::from(vec![
                record.metadata.solution_id.as_str(),
            ])),
            Arc::new(StringArray::from(vec![record.metadata.title.as_str()])),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| MemoryError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest neighbors by cosine similarity, best first.
    ///
    /// Similarity is `1 - cosine distance`, so 1.0 is a perfect match and
    /// values may go below zero for dissimilar vectors. An empty index
    /// yields an empty result without touching the underlying engine.
    #[inline]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>, MemoryError> {
        let count = self.count().await?;
        if count == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let result = self
            .embedder
            .generate_embedding(query)
            .map_err(|e| MemoryError::Embedding(format!("Failed to embed query: {}", e)))?;

        let table = self.open_table().await?;
        let results = table
            .vector_search(result.embedding)
            .map_err(|e| MemoryError::Database(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .column("vector")
            .limit(limit.min(count))
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results(results).await
    }

    async fn parse_search_results(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<(String, f32)>, MemoryError> {
        let mut matches = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to read result stream: {}", e)))?
        {
            let ids = batch
                .column_by_name("id")
                .ok_or_else(|| MemoryError::Database("Missing id column".to_string()))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| MemoryError::Database("Invalid id column type".to_string()))?;

            let distances = batch
                .column_by_name("_distance")
                .map(|col| col.as_any().downcast_ref::<Float32Array>());

            for row in 0..batch.num_rows() {
                let distance = distances
                    .flatten()
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                matches.push((ids.value(row).to_string(), 1.0 - distance));
            }
        }

        debug!("Parsed {} vector search results", matches.len());
        Ok(matches)
    }

    /// Remove the embedding for an id. Failures are reported as `false`
    /// rather than propagated.
    #[inline]
    pub async fn delete(&self, id: &str) -> bool {
        let table = match self.open_table().await {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to open table for delete: {}", e);
                return false;
            }
        };

        let predicate = format!("id = '{}'", id.replace('\'', "''"));
        match table.delete(&predicate).await {
            Ok(_) => {
                debug!("Deleted embedding for record {}", id);
                true
            }
            Err(e) => {
                warn!("Failed to delete embedding for record {}: {}", id, e);
                false
            }
        }
    }

    /// Number of indexed records
    #[inline]
    pub async fn count(&self) -> Result<usize, MemoryError> {
        let table = self.open_table().await?;

        table
            .count_rows(None)
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to count rows: {}", e)))
    }

    /// All record ids currently present in the index
    #[inline]
    pub async fn list_ids(&self) -> Result<Vec<String>, MemoryError> {
        let table = self.open_table().await?;

        let mut results = table
            .query()
            .execute()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to scan table: {}", e)))?;

        let mut ids = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| MemoryError::Database(format!("Failed to read scan stream: {}", e)))?
        {
            let id_column = batch
                .column_by_name("id")
                .ok_or_else(|| MemoryError::Database("Missing id column".to_string()))?
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| MemoryError::Database("Invalid id column type".to_string()))?;

            for row in 0..batch.num_rows() {
                ids.push(id_column.value(row).to_string());
            }
        }

        Ok(ids)
    }
}
