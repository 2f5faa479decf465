//! Git operations using git2-rs.

pub mod commit;
pub mod patch;
pub mod staged;

pub use commit::create_commit;
pub use patch::PatchFile;
pub use staged::{DiffSource, GitRepository};
