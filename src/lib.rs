//! tenaudit - Incremental audit event export for cloud tenancies
//!
//! This library partitions an export date range into fixed-size time
//! windows, fans each window out across every compartment in a tenancy,
//! paginates each query to completion and merges everything into a single
//! `{"data": [...]}` document. An optional disk-backed cache keyed by the
//! exact query signature keeps repeated runs from re-fetching windows that
//! were already retrieved.
pub mod cache;
pub mod compartments;
pub mod config;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod filter;
pub mod merge;
pub mod options;
pub mod paging;
pub mod query;
pub mod window;

// Re-export commonly used types
pub use compartments::CompartmentSet;
pub use config::EngineConfig;
pub use engine::{AuditExporter, ExportRequest};
pub use error::{ExportError, Result};
pub use query::{CliTransport, QueryCommand, QueryTransport};
