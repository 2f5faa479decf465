//! The six pipeline steps.
//!
//! Each step reads what it needs from [`PipelineState`](crate::pipeline::PipelineState),
//! calls at most its own collaborators and records what it produced. Steps
//! never decide what runs next except Validate, which returns a
//! [`Transition`](crate::pipeline::Transition).

mod analyze;
mod changelog;
mod draft;
mod fetch;
mod repair;
mod validate;

pub use analyze::analyze;
pub use changelog::changelog;
pub use draft::draft;
pub use fetch::fetch_diff;
pub use repair::repair;
pub use validate::{next_transition, validate};
