#![forbid(unsafe_code)]

//! Runs one mock service on a dedicated thread with its own current-thread runtime.
//!
//! `start` returns once the listener is accepting. `stop` (or drop) signals the
//! serve loop over a watch channel and joins the thread; the legacy `shutdown`
//! path ends the loop through the cooperative [`ShutdownFlag`].

use std::net::SocketAddr;
use std::process::Command;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use axum::Router;
use paymock_contracts::item::ItemSchema;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::MockConfig;
use crate::control::ControlApi;
use crate::error::ServiceError;
use crate::http::build_app;
use crate::rpc::{call_shared, RpcCall, RpcFault};
use crate::state::{AppContext, MockState, ShutdownFlag};

const START_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_PAY_BASE_URL: &str = "PAY_BASE_URL";
pub const ENV_SEARCH_BASE_URL: &str = "U1_SEARCH_BASE_URL";
pub const ENV_SSO_AUTH_BASE_URL: &str = "SSO_AUTH_BASE_URL";
pub const ENV_PURCHASES_BASE_URL: &str = "PURCHASES_BASE_URL";
pub const ENV_GET_CREDENTIALS: &str = "GET_CREDENTIALS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Stopped,
    Starting,
    Serving,
    Stopping,
}

#[derive(Debug, Default)]
struct LifecycleTracker {
    state: Mutex<LifecycleState>,
    changed: Condvar,
}

impl LifecycleTracker {
    fn set(&self, next: LifecycleState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
        self.changed.notify_all();
    }

    fn get(&self) -> LifecycleState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(LifecycleState::Stopped)
    }

    fn wait_until<F>(&self, reached: F, timeout: Duration) -> bool
    where
        F: Fn(LifecycleState) -> bool,
    {
        let Ok(guard) = self.state.lock() else {
            return false;
        };
        match self
            .changed
            .wait_timeout_while(guard, timeout, |state| !reached(*state))
        {
            Ok((guard, _)) => reached(*guard),
            Err(_) => false,
        }
    }
}

/// Handle to a running mock service. Dropping it stops the service.
pub struct MockServer {
    addr: SocketAddr,
    schema: ItemSchema,
    scenario: Option<String>,
    ctx: AppContext,
    stop_tx: watch::Sender<bool>,
    worker: Option<thread::JoinHandle<Result<(), ServiceError>>>,
    lifecycle: Arc<LifecycleTracker>,
}

impl MockServer {
    pub fn start(config: MockConfig) -> Result<Self, ServiceError> {
        let lifecycle = Arc::new(LifecycleTracker::default());
        lifecycle.set(LifecycleState::Starting);

        let bind_err = |source| ServiceError::Bind {
            addr: config.bind,
            source,
        };
        let listener = std::net::TcpListener::bind(config.bind).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let addr = listener.local_addr().map_err(bind_err)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServiceError::Runtime)?;

        let ctx = AppContext::new(MockState::new(
            config.schema,
            config.interaction_redirect.clone(),
        ));
        let (stop_tx, stop_rx) = watch::channel(false);
        let app = build_app(ctx.clone());
        let shutdown = ctx.shutdown.clone();
        let tracker = lifecycle.clone();
        let worker = thread::Builder::new()
            .name("paymock-serve".to_string())
            .spawn(move || {
                let result =
                    runtime.block_on(serve(listener, app, stop_rx, shutdown, tracker.clone()));
                if let Err(err) = &result {
                    warn!(error = %err, "mock service serve loop failed");
                }
                tracker.set(LifecycleState::Stopped);
                result
            })
            .map_err(ServiceError::Runtime)?;

        let mut server = Self {
            addr,
            schema: config.schema,
            scenario: config.scenario,
            ctx,
            stop_tx,
            worker: Some(worker),
            lifecycle,
        };
        if !server
            .lifecycle
            .wait_until(|s| s != LifecycleState::Starting, START_TIMEOUT)
        {
            return Err(ServiceError::LifecycleTimeout("serving"));
        }
        if server.state() != LifecycleState::Serving {
            // The worker already exited; surface its error.
            server.stop()?;
            return Err(ServiceError::LifecycleTimeout("serving"));
        }
        info!(addr = %server.addr, schema = server.schema.as_str(), "mock service started");
        Ok(server)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn schema(&self) -> ItemSchema {
        self.schema
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.base_url(), tail.trim_start_matches('/'))
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    pub fn shutdown_requested(&self) -> bool {
        self.ctx.shutdown.is_requested()
    }

    pub fn control(&self) -> ControlApi {
        ControlApi::new(self.ctx.state.clone())
    }

    /// Invokes an RPC object method in-process, bypassing HTTP.
    pub fn call(&self, object: &str, method: &str, params: Vec<Value>) -> Result<Value, RpcFault> {
        call_shared(&self.ctx, &RpcCall::new(object, method, params))
    }

    /// Variables the system under test reads to find this mock.
    pub fn environment(&self) -> Vec<(String, String)> {
        self.environment_for(self.scenario.as_deref())
    }

    pub fn environment_for(&self, scenario: Option<&str>) -> Vec<(String, String)> {
        let base = self.base_url();
        let pay_base = match scenario.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            Some(scenario) => format!("{base}/{scenario}"),
            None => base.clone(),
        };
        vec![
            (ENV_PAY_BASE_URL.to_string(), pay_base),
            (ENV_SEARCH_BASE_URL.to_string(), format!("{base}/iteminfo/")),
            (ENV_SSO_AUTH_BASE_URL.to_string(), format!("{base}/login/")),
            (ENV_PURCHASES_BASE_URL.to_string(), base),
            (ENV_GET_CREDENTIALS.to_string(), "0".to_string()),
        ]
    }

    pub fn configure_command<'a>(&self, command: &'a mut Command) -> &'a mut Command {
        command.envs(self.environment())
    }

    /// Blocks until the serve loop has exited, e.g. after the shutdown path.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        self.lifecycle
            .wait_until(|s| s == LifecycleState::Stopped, timeout)
    }

    pub fn stop(&mut self) -> Result<(), ServiceError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        if self.lifecycle.get() == LifecycleState::Serving {
            self.lifecycle.set(LifecycleState::Stopping);
        }
        self.stop_tx.send_replace(true);
        let result = worker.join().map_err(|_| ServiceError::WorkerPanicked)?;
        info!(addr = %self.addr, "mock service stopped");
        result
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "mock service stop failed");
        }
    }
}

async fn serve(
    listener: std::net::TcpListener,
    app: Router,
    mut stop_rx: watch::Receiver<bool>,
    shutdown: Arc<ShutdownFlag>,
    tracker: Arc<LifecycleTracker>,
) -> Result<(), ServiceError> {
    let listener = tokio::net::TcpListener::from_std(listener).map_err(ServiceError::Serve)?;
    tracker.set(LifecycleState::Serving);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = stop_rx.wait_for(|stop| *stop) => {}
                _ = shutdown.wait() => info!("stop requested through shutdown path"),
            }
            tracker.set(LifecycleState::Stopping);
        })
        .await
        .map_err(ServiceError::Serve)
}
