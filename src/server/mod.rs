//! HTTP serving: request parsing, response encoding and the accept loop.

pub mod http_server;
pub mod request;
pub mod response;

pub use http_server::serve;
pub use request::{parse_query_params, parse_request, ParsedRequest, RequestBody};
pub use response::{HeaderVec, HttpResponse, MAX_INLINE_HEADERS};
