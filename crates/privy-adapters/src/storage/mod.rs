//! Storage Adapters

mod file_cache;

pub use file_cache::FileCacheRepository;
