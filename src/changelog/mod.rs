//! Changelog rendering and persistence.

pub mod format;
pub mod store;

pub use format::{CHANGELOG_HEADER, render_section};
pub use store::{ChangelogStore, FileChangelogStore};
