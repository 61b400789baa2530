pub mod service;

pub use service::{ControlBus, ControlService};
