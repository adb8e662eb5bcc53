pub mod config;
pub mod ingest;
pub mod render;
pub mod store;
pub mod telemetry;
pub mod terminal;
pub mod ui;
pub mod viewport;
