//! # Issue Tracker
//!
//! A small REST API for tracking issues per project.
//!
//! ## Features
//!
//! - **Issue Resource**: create, list, update and delete issues under `/api/issues/:project`
//! - **Document Stores**: in-memory and JSON-file backends behind one async trait
//! - **Filtering**: exact-match, typed query filters scoped to a project
//! - **Configuration**: defaults, `ISSUETRACKER_*` environment variables and YAML files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use issuetracker::{IssueServer, MemoryIssueStorage, ServerConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> issuetracker::Result<()> {
//! let config = ServerConfig::load(None)?;
//! let server = IssueServer::bind(&config, Arc::new(MemoryIssueStorage::new())).await?;
//!
//! let shutdown = CancellationToken::new();
//! server.run(shutdown).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// HTTP handlers and request body parsing
pub mod api;

/// Shared utilities
pub mod common;

/// Server configuration
pub mod config;

/// Error types
pub mod error;

/// Issue documents and storage backends
pub mod issues;

/// The project-scoped issue resource
pub mod resource;

/// Router and server lifecycle
pub mod server;

pub use config::{ConfigError, ServerConfig, StorageBackend, YamlConfig};
pub use error::{ErrorContext, IssueTrackerError, Result};
pub use issues::{
    open_storage, FileSystemIssueStorage, InstrumentedIssueStorage, Issue, IssueFilter, IssueId,
    IssueStorage, MemoryIssueStorage, MetricsSnapshot, PerformanceMetrics,
};
pub use resource::{FieldMap, IssueReply, IssueResource, SoftError};
pub use server::{router, IssueServer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        IssueResource, IssueServer, IssueStorage, IssueTrackerError, Result, ServerConfig,
    };
}
