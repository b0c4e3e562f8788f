use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{FmtSubscriber, EnvFilter};

mod error;
mod net;
mod fs;
mod drive;
mod sec;
mod state;
mod routing;
mod config;

fn main() {
    use tokio::runtime::Builder;

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .expect("failed to initialize global tracing subscriber");

    let rt = match Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build() {
        Ok(rt) => rt,
        Err(err) => {
            panic!("failed to start tokio runtime. {}", err);
        }
    };

    tracing::event!(
        tracing::Level::INFO,
        "started tokio runtime"
    );

    if let Err(err) = rt.block_on(init()) {
        tracing::error!("{err}");

        std::process::exit(1);
    }
}

async fn init() -> error::Result<()> {
    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args)?;
    let state = Arc::new(state::Shared::from_config(&config)?);
    let router = routing::routes(&state);

    let addr = config.settings.listener.addr;
    let bind_error = |err: std::io::Error| error::Error::new(error::Kind::Bind)
        .message(format!("failed to bind to socket address: {addr}"))
        .source(err);

    let tcp_listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
    tcp_listener.set_nonblocking(true).map_err(bind_error)?;

    match tcp_listener.local_addr() {
        Ok(addr) => {
            tracing::info!("tcp socket listener: {addr}");
        }
        Err(err) => {
            tracing::error!("failed to retrieve tcp listener address: {err}");
        }
    }

    axum_server::from_tcp(tcp_listener)
        .serve(router.into_make_service())
        .await
        .map_err(|err| error::Error::new(error::Kind::Serve)
            .message("server error")
            .source(err))?;

    Ok(())
}
