pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod update;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    CollectionSpec, DocumentStore, FindOptions, StoreError, UniqueIndex, UpdateManyResult,
};
pub use update::UpdateDocument;
