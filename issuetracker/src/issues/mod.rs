//! Issue documents and the stores that hold them

/// Filesystem-backed issue storage, one JSON document per issue
pub mod filesystem;
/// Exact-match query filters over issue fields
pub mod filter;
/// Storage wrapper that collects performance metrics for all operations
pub mod instrumented_storage;
/// In-memory issue storage
pub mod memory;
/// Performance metrics collection and analysis
pub mod metrics;
/// Issue document types and field coercion
pub mod model;
/// The storage trait and the indexed in-memory collection
pub mod storage;

pub use filesystem::FileSystemIssueStorage;
pub use filter::{FilterValue, IssueFilter};
pub use instrumented_storage::InstrumentedIssueStorage;
pub use memory::{MemoryIssueStorage, MemoryStorageConfig};
pub use metrics::{MetricsSnapshot, Operation, OperationSnapshot, PerformanceMetrics};
pub use model::{is_truthy, Issue, IssueField, IssueId, IssueUpdate, NewIssue};
pub use storage::{IssueCollection, IssueStorage};

use crate::config::{ServerConfig, StorageBackend};
use crate::error::Result;

/// Open the backend selected by `config`
pub fn open_storage(config: &ServerConfig) -> Result<Box<dyn IssueStorage>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory issue storage");
            Ok(Box::new(MemoryIssueStorage::new()))
        }
        StorageBackend::Filesystem => {
            tracing::debug!("Using filesystem issue storage at {}", config.data_dir.display());
            Ok(Box::new(FileSystemIssueStorage::new(config.data_dir.clone())?))
        }
    }
}
