pub mod models;
pub mod services;
pub mod utils;

use std::path::PathBuf;

// Re-export commonly used types
pub use models::{ExtensionKey, NO_EXTENSION_FOLDER};
pub use services::{
    sort_files_by_extension, validate_source, Collision, CopyError, SortConfig, SortError,
    SortReport,
};
pub use utils::CopyResult;

/// Process-wide logging settings, applied once at startup
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sort: SortConfig,
    pub log: LogConfig,
    /// Where to write the JSON run report, if anywhere
    pub report: Option<PathBuf>,
}
