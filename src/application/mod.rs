//! Application services: the staff session and the render flow.

pub mod access;
pub mod delivery;
pub mod error;
pub mod install;
pub mod render;
pub mod session;
