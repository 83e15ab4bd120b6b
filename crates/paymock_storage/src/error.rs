#![forbid(unsafe_code)]

use paymock_contracts::ContractViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidArgument,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("store {store} has no such item {id}")]
    ItemNotFound { store: String, id: String },
    #[error("no such package {0}")]
    StoreNotFound(String),
    #[error("store {store} already has item {id}")]
    DuplicateItem { store: String, id: String },
    #[error("store {0} already exists")]
    DuplicateStore(String),
    #[error("invalid item property {0}")]
    UnknownProperty(String),
    #[error("{0}")]
    Rejected(&'static str),
    #[error("{0}")]
    Contract(#[from] ContractViolation),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::ItemNotFound { .. } | StorageError::StoreNotFound(_) => {
                ErrorKind::NotFound
            }
            StorageError::DuplicateItem { .. } | StorageError::DuplicateStore(_) => {
                ErrorKind::AlreadyExists
            }
            StorageError::UnknownProperty(_)
            | StorageError::Rejected(_)
            | StorageError::Contract(_) => ErrorKind::InvalidArgument,
        }
    }
}
