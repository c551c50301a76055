/// Database model definitions.
pub mod models;
/// Session storage and retrieval operations.
pub mod session_store;
/// Storage abstraction layer for backend errors.
pub mod storage;
