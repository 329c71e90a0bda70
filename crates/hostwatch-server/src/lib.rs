pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod query;
pub mod sampler;
pub mod sink;
pub mod state;
