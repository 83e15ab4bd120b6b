#![forbid(unsafe_code)]

//! Side channel the test driver uses to change what later requests see.
//!
//! [`ControlApi`] mutates the shared state directly. [`routes`] exposes the same
//! operations under `/__control/` for drivers living in another process.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use paymock_contracts::catalog::{PaymentMethodCatalog, PaymentType};
use paymock_contracts::item::PropertyBag;
use paymock_contracts::session::{EndpointCategory, SessionFlags};
use tracing::info;

use crate::error::ServiceError;
use crate::state::{lock_state, AppContext, SharedState};

/// Point-in-time copy of the backend fixture.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ControlSnapshot {
    pub flags: SessionFlags,
    pub catalog: PaymentMethodCatalog,
    pub stores: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ControlApi {
    state: SharedState,
}

impl ControlApi {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub fn snapshot(&self) -> Result<ControlSnapshot, ServiceError> {
        let state = lock_state(&self.state)?;
        Ok(ControlSnapshot {
            flags: state.backend.flags().clone(),
            catalog: state.backend.catalog().clone(),
            stores: state.stores.store_names(),
        })
    }

    pub fn replace_catalog(&self, catalog: PaymentMethodCatalog) -> Result<(), ServiceError> {
        let types = catalog.types().len();
        lock_state(&self.state)?.backend.replace_catalog(catalog);
        info!(types, "payment method catalog replaced");
        Ok(())
    }

    pub fn add_payment_type(&self, payment_type: PaymentType) -> Result<(), ServiceError> {
        let id = payment_type.id.clone();
        lock_state(&self.state)?
            .backend
            .upsert_payment_type(payment_type)?;
        info!(payment_type = %id, "payment type added");
        Ok(())
    }

    pub fn set_fail(&self, fail: bool) -> Result<(), ServiceError> {
        lock_state(&self.state)?.backend.set_fail(fail);
        info!(fail, "failure injection toggled");
        Ok(())
    }

    pub fn set_endpoint_failure(
        &self,
        category: EndpointCategory,
        failing: bool,
    ) -> Result<(), ServiceError> {
        lock_state(&self.state)?
            .backend
            .set_endpoint_failure(category, failing);
        info!(endpoint = category.as_str(), failing, "endpoint failure toggled");
        Ok(())
    }

    /// Purchases answer `InProgress` with this redirect until cleared. `None` uses
    /// the configured default target.
    pub fn require_interaction(&self, redirect_to: Option<&str>) -> Result<String, ServiceError> {
        let mut state = lock_state(&self.state)?;
        let target = redirect_to
            .map(str::to_string)
            .unwrap_or_else(|| state.interaction_redirect.clone());
        state.backend.require_interaction(Some(target.clone()));
        info!(redirect_to = %target, "purchases now require interaction");
        Ok(target)
    }

    pub fn clear_interaction(&self) -> Result<(), ServiceError> {
        lock_state(&self.state)?.backend.require_interaction(None);
        info!("purchase interaction cleared");
        Ok(())
    }

    pub fn set_interaction_cancelled(&self, cancelled: bool) -> Result<(), ServiceError> {
        lock_state(&self.state)?
            .backend
            .set_interaction_cancelled(cancelled);
        info!(cancelled, "interaction result set");
        Ok(())
    }

    pub fn complete_add(&self) -> Result<usize, ServiceError> {
        let count = lock_state(&self.state)?.backend.complete_add()?;
        info!(choices = count, "add-card flow completed via control");
        Ok(count)
    }

    /// Registers a store and returns its object path.
    pub fn add_store(&self, package_name: &str, items: &[PropertyBag]) -> Result<String, ServiceError> {
        let mut state = lock_state(&self.state)?;
        let path = state
            .stores
            .add_store(package_name, items)?
            .object_path()
            .to_string();
        info!(store = package_name, items = items.len(), path = %path, "store added");
        Ok(path)
    }

    pub fn get_stores(&self) -> Result<Vec<String>, ServiceError> {
        Ok(lock_state(&self.state)?.stores.store_names())
    }

    pub fn add_item(&self, package_name: &str, item: &PropertyBag) -> Result<PropertyBag, ServiceError> {
        let out = lock_state(&self.state)?.stores.add_item(package_name, item)?;
        info!(store = package_name, "item added");
        Ok(out)
    }

    pub fn set_item(&self, package_name: &str, item: &PropertyBag) -> Result<PropertyBag, ServiceError> {
        let out = lock_state(&self.state)?.stores.set_item(package_name, item)?;
        info!(store = package_name, "item updated");
        Ok(out)
    }

    pub fn item(&self, package_name: &str, id: &str) -> Result<PropertyBag, ServiceError> {
        let state = lock_state(&self.state)?;
        Ok(state.stores.store(package_name)?.get(id)?)
    }
}

#[derive(Debug, serde::Deserialize)]
struct FailRequest {
    enabled: bool,
    #[serde(default)]
    category: Option<EndpointCategory>,
}

#[derive(Debug, serde::Deserialize)]
struct InteractionRequest {
    #[serde(default)]
    redirect_to: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CancelRequest {
    #[serde(default = "default_cancelled")]
    cancelled: bool,
}

fn default_cancelled() -> bool {
    true
}

type ControlResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

fn reject(err: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        ServiceError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/state", get(state_handler))
        .route("/fail", post(fail_handler))
        .route(
            "/interaction",
            post(require_interaction_handler).delete(clear_interaction_handler),
        )
        .route("/cancel", post(cancel_handler))
        .route(
            "/payment-methods",
            put(replace_catalog_handler).post(add_payment_type_handler),
        )
        .route("/complete-add", post(complete_add_handler))
}

async fn state_handler(
    State(ctx): State<AppContext>,
) -> Result<Json<ControlSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    let snapshot = ControlApi::new(ctx.state).snapshot().map_err(reject)?;
    Ok(Json(snapshot))
}

async fn fail_handler(
    State(ctx): State<AppContext>,
    Json(request): Json<FailRequest>,
) -> ControlResult {
    let control = ControlApi::new(ctx.state);
    let applied = match request.category {
        Some(category) => control.set_endpoint_failure(category, request.enabled),
        None => control.set_fail(request.enabled),
    };
    applied.map_err(reject)?;
    Ok(ok())
}

async fn require_interaction_handler(
    State(ctx): State<AppContext>,
    Json(request): Json<InteractionRequest>,
) -> ControlResult {
    let target = ControlApi::new(ctx.state)
        .require_interaction(request.redirect_to.as_deref())
        .map_err(reject)?;
    Ok(Json(serde_json::json!({ "redirect_to": target })))
}

async fn clear_interaction_handler(State(ctx): State<AppContext>) -> ControlResult {
    ControlApi::new(ctx.state)
        .clear_interaction()
        .map_err(reject)?;
    Ok(ok())
}

async fn cancel_handler(
    State(ctx): State<AppContext>,
    Json(request): Json<CancelRequest>,
) -> ControlResult {
    ControlApi::new(ctx.state)
        .set_interaction_cancelled(request.cancelled)
        .map_err(reject)?;
    Ok(ok())
}

async fn replace_catalog_handler(
    State(ctx): State<AppContext>,
    Json(types): Json<Vec<PaymentType>>,
) -> ControlResult {
    let catalog = PaymentMethodCatalog::new(types).map_err(|e| reject(e.into()))?;
    ControlApi::new(ctx.state)
        .replace_catalog(catalog)
        .map_err(reject)?;
    Ok(ok())
}

async fn add_payment_type_handler(
    State(ctx): State<AppContext>,
    Json(payment_type): Json<PaymentType>,
) -> ControlResult {
    ControlApi::new(ctx.state)
        .add_payment_type(payment_type)
        .map_err(reject)?;
    Ok(ok())
}

async fn complete_add_handler(State(ctx): State<AppContext>) -> ControlResult {
    let count = ControlApi::new(ctx.state).complete_add().map_err(reject)?;
    Ok(Json(serde_json::json!({ "choices": count })))
}
