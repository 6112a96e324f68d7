//! Observability utilities.

mod logging;

pub use logging::{default_directive, env_filter, init_logging, LogFormat};
