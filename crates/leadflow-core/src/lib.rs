//! Record and vocabulary types shared by every leadflow crate.

mod email;
pub mod error;
mod record;
pub mod types;

pub use email::{derive_plus_address, resolve_student_email};
pub use error::*;
pub use record::{Attachment, FieldValue, Fields, Record, RecordId};
pub use types::*;
