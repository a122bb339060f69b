//! PIN-gated barber try-on: submit a selfie and a haircut style to a render
//! service, poll the job, then share or save the finished image.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
