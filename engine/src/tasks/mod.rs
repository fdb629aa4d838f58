//! External analysis task wrappers
//!
//! Thin capability wrappers around the task-invocation seam, one per
//! family of external tools. The workflow controller holds these as
//! collaborators passed in at construction; it never builds a
//! `TaskRequest` itself. Each wrapper method maps directly onto one
//! external tool and keeps the invoker's contract: `Ok(None)` when the
//! tool produced nothing usable, `Err` only for unexpected faults.

pub mod calling;
pub mod filter;
pub mod format;
pub mod metadata;
pub mod qc;

pub use calling::CallingTasks;
pub use filter::FilterTasks;
pub use format::FormatTasks;
pub use metadata::MetadataTasks;
pub use qc::QcTasks;
