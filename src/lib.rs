//! httpgen turns an API design (user types, validations and HTTP bindings)
//! into the Rust source of an HTTP server transport layer.
//!
//! ```
//! use httpgen::design::{Action, Attribute, Design, HttpResponse, Object, Service};
//! use httpgen::{Config, Generator};
//!
//! let design = Design::new().with_service(
//!     Service::new("accounts").with_base_path("/accounts").with_action(
//!         Action::new("show")
//!             .with_route("GET", "/{id}")
//!             .with_payload(
//!                 Attribute::object(Object::new().with("id", Attribute::int())).required(["id"]),
//!             )
//!             .with_params(
//!                 Attribute::object(Object::new().with("id", Attribute::int())).required(["id"]),
//!             )
//!             .with_response(HttpResponse::new(204)),
//!     ),
//! );
//!
//! let generator = Generator::new(Config::default())?;
//! let artifacts = generator.generate(&design)?;
//! assert_eq!(artifacts[0].path, "transport/http/accounts_server.rs");
//! # Ok::<(), httpgen::Error>(())
//! ```
#![deny(unsafe_code)]

pub mod codegen;
pub mod core;
pub mod design;
pub mod generator;
pub mod rest;

pub use crate::core::{Config, Error, Result, TemplateRegistry};
pub use generator::Generator;
