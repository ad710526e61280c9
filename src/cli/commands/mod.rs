//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod export;
mod serve;
mod tables;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use export::run_export;
pub use serve::{router, run_serve, AppState, ChatRequest, ChatResponse};
pub use tables::run_tables;
