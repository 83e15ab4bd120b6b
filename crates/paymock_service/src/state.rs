#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use paymock_contracts::item::ItemSchema;
use paymock_storage::{BackendFixture, FixtureStore};
use tokio::sync::Notify;

use crate::error::ServiceError;

/// Everything a request or control call can read or change.
#[derive(Debug, Clone)]
pub struct MockState {
    pub stores: FixtureStore,
    pub backend: BackendFixture,
    pub interaction_redirect: String,
}

impl MockState {
    pub fn new(schema: ItemSchema, interaction_redirect: impl Into<String>) -> Self {
        Self {
            stores: FixtureStore::new_in_memory(schema),
            backend: BackendFixture::seeded(),
            interaction_redirect: interaction_redirect.into(),
        }
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

pub(crate) fn lock_state(state: &SharedState) -> Result<MutexGuard<'_, MockState>, ServiceError> {
    state.lock().map_err(|_| ServiceError::Poisoned)
}

/// Cooperative stop request raised by the legacy `shutdown` path.
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        loop {
            // Register before checking so a request between the two is not missed.
            let notified = self.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Axum state shared by every route.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub state: SharedState,
    pub shutdown: Arc<ShutdownFlag>,
}

impl AppContext {
    pub fn new(state: MockState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            shutdown: Arc::new(ShutdownFlag::default()),
        }
    }
}
