//! Staged diff parsing.
//!
//! Turns unified diff text into ordered [`ChangeRecord`]s, one per file.

pub mod parser;
pub mod record;

pub use parser::parse_diff;
pub use record::{ChangeKind, ChangeRecord, Hunk};
