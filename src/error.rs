//! Server-level error type.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Infrastructure failure while starting the server.
///
/// Request-level failures (bad input, unknown ids) never surface here. They
/// are answered as HTTP responses through [`ApiError`](crate::api::ApiError).
/// Errors on individual accepted connections are logged and the loop goes on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),
}
