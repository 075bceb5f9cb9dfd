//! # Router Module
//!
//! Path matching and route resolution. Route patterns (e.g. `/users/:id`)
//! are parsed into segment lists at registration; incoming requests are
//! resolved by scanning the namespace's route table in registration order
//! and selecting the first descriptor whose method and pattern match.
//!
//! ## Architecture
//!
//! 1. **Registration**: pattern strings are parsed into [`PathPattern`]
//!    values (literal and `:param` segments) and collected into a
//!    [`RouteSet`] for exactly one function namespace.
//!
//! 2. **Matching**: for each incoming request, the table is scanned in
//!    order; a parameter segment consumes and records the corresponding
//!    path segment verbatim, a literal segment must match exactly.
//!
//! Overlapping patterns resolve to whichever route was registered first;
//! resolution is order-sensitive by design, not most-specific-match.

mod core;

pub use core::{ParamVec, PathPattern, RouteMatch, RouteSet, MAX_INLINE_PARAMS};
