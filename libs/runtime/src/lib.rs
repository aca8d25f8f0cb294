//! Process plumbing: layered configuration, logging, home directory and
//! shutdown signals.

pub mod config;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use config::{
    ApiConfig, AppConfig, CliArgs, DatabaseConfig, EntityIdCacheConfig, LoggingConfig, Section,
    ServerConfig,
};
pub use logging::init_logging_from_config;
pub use shutdown::wait_for_shutdown;
