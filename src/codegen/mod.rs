//! Code synthesis shared by every transport.

pub mod validation;

pub use validation::ValidationSynthesizer;
