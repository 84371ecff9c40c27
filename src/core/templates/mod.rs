//! Template system for code generation.
//!
//! Validation snippets and server file sections are rendered from named Tera
//! templates held by an explicit [`TemplateRegistry`].

pub mod registry;

pub use registry::*;
