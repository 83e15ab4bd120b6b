#![forbid(unsafe_code)]

pub mod backend;
pub mod catalog;
pub mod common;
pub mod item;
pub mod object_path;
pub mod session;

pub use common::{ContractViolation, UnixTimeSecs, Validate};
