//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SwitchyardConfig (validated, immutable)
//!     → handed to the HTTP host and observability at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the route table is code, not config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::SecurityConfig;
pub use schema::SwitchyardConfig;
pub use schema::TimeoutConfig;
pub use validation::ValidationError;
