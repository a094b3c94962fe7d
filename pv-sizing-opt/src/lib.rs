pub mod error;
pub mod general;
pub mod sizing;

// Re-export commonly used items for convenience
pub use error::{Result, SizingError};
pub use sizing::{SizingConfig, run_sizing, size_reference};
