//! Gateway server: accept loop, per-connection service, graceful shutdown.

use std::net::SocketAddr;

use hyper_util::rt::TokioIo;
use tokio::net::{
    TcpListener,
    TcpStream,
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{
        GatewayState,
        accept_request,
    },
    error::Result,
};

/// A bound, ready-to-run gateway. Built by [`crate::GatewayConfig::build`].
pub struct Gateway {
    listener: TcpListener,
    state: GatewayState,
}

impl Gateway {
    pub fn new(listener: TcpListener, state: GatewayState) -> Self {
        Self { listener, state }
    }

    /// Address the listener actually bound, useful with port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until the cancellation token fires.
    pub async fn run(self, cancel_token: CancellationToken) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "rollup gateway listening");

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    tracing::info!("gateway received cancellation signal, shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            serve_connection(stream, peer, self.state.clone());
                        }
                        Err(err) => {
                            tracing::error!(?err, "error accepting connection");
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn serve_connection(stream: TcpStream, peer: SocketAddr, state: GatewayState) {
    tracing::debug!(%peer, "connection accepted");
    let io = TokioIo::new(stream);

    tokio::task::spawn(async move {
        let service = hyper::service::service_fn(move |request| {
            let state = state.clone();
            async move { accept_request(request, state).await }
        });

        if let Err(err) = hyper::server::conn::http1::Builder::new()
            .serve_connection(io, service)
            .await
        {
            tracing::error!(?err, "error serving connection");
        }
    });
}
