pub mod evaluate;
pub mod init;
pub mod regrade;
pub mod summary;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;

use examgrade_core::engine::GradingEngine;
use examgrade_store::config::{create_store, ExamgradeConfig, StoreConfig, Stores};

/// Open the configured store. The memory store starts empty in every
/// process, so the CLI only accepts a persistent one.
pub fn open_stores(config: &ExamgradeConfig) -> Result<Stores> {
    if config.store == StoreConfig::Memory {
        anyhow::bail!(
            "the memory store is empty in a new process and only usable as a library; \
             configure a json_dir store"
        );
    }
    create_store(&config.store)
}

/// Open the configured store and build an engine over it.
pub fn open_engine(config: &ExamgradeConfig) -> Result<(Stores, GradingEngine)> {
    let stores = open_stores(config)?;
    let engine = GradingEngine::new(
        Arc::clone(&stores.attempts),
        Arc::clone(&stores.exams),
        config.engine_config(),
    );
    Ok((stores, engine))
}
