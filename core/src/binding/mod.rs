#![deny(missing_docs)]

//! # Binding Module
//!
//! The boundary between the HTTP layer and the validation engine.
//!
//! Handles:
//! - Raw request extraction and positional handler arguments.
//! - Parameter binding per location (query, header, path, request, body).
//! - Request body content-type selection and discriminated unions.
//! - Response validation, reclassifying failures as server faults.

pub mod body;
pub mod params;
pub mod request;
pub mod responses;

pub use body::{Discriminator, FnDiscriminator, RequestBodyDescriptor, BODY_ROOT};
pub use params::{ParamLocation, ParameterDescriptor, RouteDescriptor};
pub use request::{Argument, RawRequest};
pub use responses::{ResponseDescriptor, ResponseRules, RESPONSE_ROOT};
