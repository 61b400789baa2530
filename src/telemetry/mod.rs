pub mod models;
pub mod service;

pub use models::{decode_reading, DecodeError};
pub use service::TelemetryService;
