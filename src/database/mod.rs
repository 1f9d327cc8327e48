pub mod document;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;
pub mod update;

pub use document::collections;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::{DeleteResult, DocumentStore, InsertOneResult, UpdateOptions, UpdateResult};
pub use update::Update;
