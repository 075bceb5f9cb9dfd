//! # Dispatcher Module
//!
//! The per-request state machine. A [`Dispatcher`] owns the route table for
//! one function namespace plus the authenticator and CORS policy, and turns
//! every [`ParsedRequest`](crate::server::ParsedRequest) into an
//! [`HttpResponse`](crate::server::HttpResponse):
//!
//! - `OPTIONS` requests short-circuit to a CORS preflight response.
//! - Route resolution scans the table in registration order; the first
//!   descriptor whose method and pattern match wins.
//! - Authentication runs unless the route opted out.
//! - Inputs are validated and coerced against the route's declared shapes.
//! - The action runs with typed inputs; its outcome (success, redirect or
//!   typed error) is encoded here and nowhere else.

mod core;

pub use core::{Dispatcher, HandlerRequest};
