//! mp-core: shared building blocks for meta-publish
//!
//! Configuration loading, secret handling and the core error type.

pub mod config;
pub mod error;
pub mod secret;

pub use config::{GraphConfig, PublishConfig};
pub use error::{Error, Result};
pub use secret::SecretString;
