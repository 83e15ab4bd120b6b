#![forbid(unsafe_code)]

use std::net::SocketAddr;

use paymock_contracts::ContractViolation;
use paymock_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build serve runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("http serve loop failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("server did not reach {0} in time")]
    LifecycleTimeout(&'static str),
    #[error("serve thread panicked")]
    WorkerPanicked,
    #[error("mock state lock poisoned")]
    Poisoned,
    #[error("invalid configuration {key}: {reason}")]
    Config { key: &'static str, reason: String },
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Contract(#[from] ContractViolation),
}
