//! Persistence and caching

pub mod cache;
pub mod store;

// Re-export commonly used types
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use store::{CachedStore, JsonFileStore, LocalFirstStore, SaveOutcome, Store};

use std::path::Path;

/// File store for `data_dir`, mirrored to `mirror_dir` when one is given
pub fn open_store(data_dir: &Path, mirror_dir: Option<&Path>) -> Box<dyn Store + Send + Sync> {
    let local = JsonFileStore::new(data_dir);
    match mirror_dir {
        Some(mirror) => Box::new(LocalFirstStore::new(local, JsonFileStore::new(mirror))),
        None => Box::new(local),
    }
}
