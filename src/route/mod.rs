//! # Route Module
//!
//! The route descriptor and its chainable builder. A [`Route`] accumulates
//! a method, a path pattern, declared shapes for path parameters, query
//! parameters and body, an authentication-disabled flag, and the action to
//! invoke.
//!
//! The builder is a small state machine: each setter consumes the value and
//! returns a new descriptor, and any step that could invalidate a
//! previously attached handler (replacing a schema, flipping the auth mode)
//! resets the action to the "not implemented" sentinel. Construction-time
//! misuse (a parameterized pattern through a parameter-free constructor, a
//! body schema on GET) panics at registration rather than misbehaving at
//! request time.

mod core;

pub use core::{Action, BodySpec, HandlerFuture, Route};
