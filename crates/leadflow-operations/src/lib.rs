//! Business operations of leadflow and the collaborators they run against.
//!
//! Operations are generic over the [`traits`] they need, so the same lead
//! conversion runs against the JSON-file store from the CLI and against the
//! in-memory store in tests.

mod error;
pub mod operations;
pub mod providers;
pub mod traits;

#[cfg(test)]
pub mod mocks;

pub use error::{CompensationFailure, OperationError, Result, error_chain};
