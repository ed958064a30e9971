//! arbv-sc specific configuration

use std::path::PathBuf;

/// Session controller service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub locale: String,
    pub port: u16,
}
