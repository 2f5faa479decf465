//! Conventional commit vocabulary, structural linting and scope hints.

pub mod lint;
pub mod scope;
pub mod types;

pub use lint::{MAX_MESSAGE_CHARS, check_structure};
pub use scope::scope_hints;
pub use types::CommitType;
