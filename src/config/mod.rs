//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CycleConfig (validated, immutable)
//!     → split into per-client settings in main.rs
//! ```
//!
//! # Design Decisions
//! - Config is read once per run; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AlertConfig, ControlPlaneConfig, CycleConfig, LogRotation, ObservabilityConfig, RestartConfig,
    RunConfig, ServiceConfig,
};
