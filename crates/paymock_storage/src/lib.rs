#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod fixture;
pub mod store;

pub use backend::BackendFixture;
pub use error::{ErrorKind, StorageError};
pub use fixture::FixtureStore;
pub use store::{Item, Store, StoreKind};
