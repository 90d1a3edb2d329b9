// Storage modules
// SQLite holds the canonical records, tags, and the keyword (FTS5) index;
// LanceDB holds one embedding per record for semantic search.

pub mod lancedb;
pub mod sqlite;
