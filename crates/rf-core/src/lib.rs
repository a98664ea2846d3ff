//! rf-core: stable foundation for resflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (dense compact IDs for nodes and channels)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{RfError, RfResult};
pub use ids::*;
pub use numeric::*;
