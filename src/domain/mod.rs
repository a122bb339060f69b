//! Domain layer types and invariants.

pub mod error;
pub mod render_jobs;
pub mod selfie;
pub mod styles;
