//! HTTP transport generation: wire helpers, name mapping, server binding
//! data and the server file plan.

pub mod files;
pub mod mapper;
pub mod server;
pub mod wire;

pub use files::{Artifact, Section, ServerFile, server_file};
pub use mapper::{NameMapping, map_attributes};
pub use server::{
    ActionData, ErrorData, HeaderData, ParamData, PayloadData, ResponseData, RouteData,
    ServerBuilder, ServerData, order_responses,
};
pub use wire::{BodyType, Conversion, request_body_type, response_body_type};
