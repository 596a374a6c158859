//! decom-common - shared data model for the decom sweep engine
//!
//! Pure data types: resource catalogues and the destruction phase table,
//! preservation tag constants, discovered-resource records, destruction
//! attempts, and the run summary projection. No I/O lives here.

pub mod attempt;
pub mod record;
pub mod resource_kind;
pub mod summary;
pub mod tags;

pub use attempt::{AttemptKey, AttemptStatus, DestructionAttempt};
pub use record::{Account, ResourceRecord};
pub use resource_kind::ResourceKind;
pub use summary::RunSummary;
