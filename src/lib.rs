//! DEX Maker Bot - Main Library
//!
//! Root crate for the maker bot binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI helpers)
//! - **maker**: Core business logic (re-exported from workspace)

// Re-export workspace libraries for convenience
pub use maker;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
}
