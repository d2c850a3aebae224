// Journal entries: data model, filter specification and pipeline, storage,
// analysis orchestration and HTTP handlers.

pub mod analysis;
pub mod filter;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod pipeline;
pub mod repository;
