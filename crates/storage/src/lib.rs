#![forbid(unsafe_code)]

pub mod sqlite;
pub mod store;

pub use sqlite::{SqliteInitError, SqliteStore};
pub use store::{ContentLookup, CourseRepository, FactStore, InMemoryStore, Storage, StorageError};
