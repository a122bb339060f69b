pub mod delivery;
pub mod error;
pub mod http;
pub mod render_client;
pub mod telemetry;
