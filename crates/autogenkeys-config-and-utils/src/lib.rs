//! Configuration, paths, errors and logging setup shared by the autogenkeys crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, RegistryBackend, DEFAULT_LOG_LEVEL, DEFAULT_RUNTIME_VERSION};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogFormat};
pub use paths::Paths;
