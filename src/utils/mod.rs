//! Utility modules for configuration, error handling and file discovery.

pub mod config;
pub mod error;
pub mod files;

// Re-export commonly used error types for convenience
pub use error::{
    ConfigurationError, ConsistencyError, ConvertError, DependencyError, OutputError,
    ValidationError,
};
