// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod rtdb_store;
pub mod sse;
