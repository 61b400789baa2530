pub mod analytics;
pub mod api;
pub mod config;
pub mod control;
pub mod db;
pub mod mqtt;
pub mod reading_cache;
pub mod telemetry;
