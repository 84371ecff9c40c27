//! Core building blocks shared by the generator: errors, configuration,
//! identifier helpers and the template registry.

pub mod config;
pub mod error;
pub mod templates;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use templates::TemplateRegistry;
