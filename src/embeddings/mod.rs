// Embedding generation module
// Wraps the Ollama HTTP API used to embed record documents and queries

pub mod ollama;
