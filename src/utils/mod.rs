pub mod config;
pub mod logger;
pub mod postdex_toml;

pub use config::*;
pub use logger::setup_logging;
