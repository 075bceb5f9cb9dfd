use super::request::parse_request;
use super::response::HttpResponse;
use crate::dispatcher::Dispatcher;
use http::Method;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Serve one function namespace's route table.
///
/// Binds the listener and accepts connections forever, handling each
/// connection on its own task and each request as an independent
/// asynchronous unit of work. Request timeouts and connection limits are
/// the hosting runtime's responsibility; this loop does not enforce them.
pub async fn serve(dispatcher: Dispatcher, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(
        addr = %addr,
        namespace = %dispatcher.routes().namespace(),
        "Accepting connections"
    );
    dispatcher.routes().dump_routes();

    let dispatcher = Arc::new(dispatcher);
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let dispatcher = Arc::clone(&dispatcher);
                async move { Ok::<_, Infallible>(handle(req, &dispatcher).await) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(peer_addr = %peer_addr, error = %e, "Connection closed with error");
            }
        });
    }
}

/// Parse one request and run it through the dispatcher.
///
/// `GET /health` is answered before dispatch so orchestrators can probe the
/// process without touching the route table.
async fn handle(
    req: hyper::Request<Incoming>,
    dispatcher: &Dispatcher,
) -> hyper::Response<Full<Bytes>> {
    let parsed = parse_request(req).await;

    if parsed.method == Method::GET && parsed.path == "/health" {
        return HttpResponse::json(200, &json!({ "status": "ok" })).into_hyper();
    }

    dispatcher.dispatch(parsed).await.into_hyper()
}
