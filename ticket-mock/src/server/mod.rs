use std::{path::Path, sync::Arc, time::Duration};

use rama::{
    Layer as _,
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::{
        HeaderValue,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
    },
    layer::TimeoutLayer,
    net::{address::SocketAddress, socket::Interface},
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use crate::simulator::Simulator;

pub mod api;
mod dashboard;


const SERVER_HEADER_VALUE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Runs the mock ticketing HTTP server until the guard initiates shutdown.
///
/// The bound address is written to `<data>/ticket-mock.addr.txt`,
/// so that test harnesses can bind to port `0` and discover the port.
pub async fn run_mock_server(
    data: &Path,
    guard: ShutdownGuard,
    bind: Interface,
    simulator: Simulator,
) -> Result<(), BoxError> {
    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(SERVER_HEADER_VALUE)),
    )
        .into_layer(self::api::web_svc(simulator));

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));

    let tcp_svc = TimeoutLayer::new(Duration::from_secs(60)).into_layer(http_server);

    let tcp_listener = TcpListener::bind(bind, exec)
        .await
        .context("bind mock ticketing http server")?;

    let server_addr = tcp_listener
        .local_addr()
        .context("get bound address for mock ticketing http server")?;

    tracing::info!("mock ticketing http server bound to: {server_addr}");
    write_server_socket_address_as_file(data, "ticket-mock", server_addr.into()).await?;

    tcp_listener.serve(tcp_svc).await;

    Ok(())
}

async fn write_server_socket_address_as_file(
    dir: &Path,
    name: &str,
    addr: SocketAddress,
) -> Result<(), BoxError> {
    let path = dir.join(format!("{name}.addr.txt"));
    tokio::fs::write(&path, addr.to_string())
        .await
        .context("write server's socket address to file")
        .context_field("address", addr)
        .with_context_debug_field("path", || path.to_owned())
}
