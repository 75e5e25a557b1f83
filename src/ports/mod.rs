//! Port traits the domain talks to; implementations live in `adapters`.

pub mod config_port;
pub mod model_port;
pub mod price_port;
pub mod signal_port;
