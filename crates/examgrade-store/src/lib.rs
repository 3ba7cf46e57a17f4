//! examgrade-store: Attempt and exam storage backends.
//!
//! Implements the `AttemptStore` and `ExamStore` traits for an in-memory map
//! and for a directory of JSON documents, and loads the examgrade
//! configuration that selects between them.

pub mod config;
pub mod error;
pub mod json_dir;
pub mod memory;

pub use config::{
    create_store, load_config, load_config_from, ExamgradeConfig, StoreConfig, Stores,
};
pub use error::StoreError;
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
