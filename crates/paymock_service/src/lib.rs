#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod markup;
pub mod render;
pub mod router;
pub mod rpc;
pub mod state;
pub mod telemetry;

pub use config::MockConfig;
pub use control::{ControlApi, ControlSnapshot};
pub use error::ServiceError;
pub use lifecycle::{LifecycleState, MockServer};
pub use rpc::{RpcCall, RpcFault, RpcReply};
