pub mod error;
pub mod models;
pub mod search;
pub mod store;
pub mod util;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use store::FileStore;

pub mod memory_store;
pub use memory_store::MemoryFileStore;
