#![forbid(unsafe_code)]

//! Object-exposure transport for the store daemon mock.
//!
//! Calls arrive as `POST /rpc` with `{object, method, params, id}`. Every failure
//! answers the same fault name, always with HTTP 200.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use paymock_contracts::item::PropertyBag;
use paymock_contracts::object_path::MAIN_OBJECT_PATH;
use paymock_contracts::UnixTimeSecs;
use paymock_storage::{StorageError, Store};
use serde_json::Value;
use tracing::debug;

use crate::error::ServiceError;
use crate::state::{lock_state, AppContext, MockState};

pub const INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct RpcFault {
    pub name: String,
    pub message: String,
}

impl RpcFault {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self {
            name: INVALID_ARGS.to_string(),
            message: message.into(),
        }
    }
}

impl From<StorageError> for RpcFault {
    fn from(err: StorageError) -> Self {
        Self::invalid_args(err.to_string())
    }
}

impl From<ServiceError> for RpcFault {
    fn from(err: ServiceError) -> Self {
        Self::invalid_args(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RpcCall {
    pub object: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default)]
    pub id: Value,
}

impl RpcCall {
    pub fn new(object: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
            params,
            id: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RpcReply {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<RpcFault>,
}

impl RpcReply {
    pub fn from_outcome(id: Value, outcome: Result<Value, RpcFault>) -> Self {
        match outcome {
            Ok(result) => Self {
                id,
                result: Some(result),
                error: None,
            },
            Err(fault) => Self {
                id,
                result: None,
                error: Some(fault),
            },
        }
    }
}

/// Positional parameter access with faults naming the method.
struct Params<'a> {
    method: &'a str,
    values: &'a [Value],
}

impl<'a> Params<'a> {
    fn expect_len(&self, n: usize) -> Result<(), RpcFault> {
        if self.values.len() != n {
            return Err(RpcFault::invalid_args(format!(
                "{} expects {n} argument(s), got {}",
                self.method,
                self.values.len()
            )));
        }
        Ok(())
    }

    fn string(&self, idx: usize) -> Result<&'a str, RpcFault> {
        self.values
            .get(idx)
            .and_then(Value::as_str)
            .ok_or_else(|| self.bad_arg(idx, "a string"))
    }

    fn bag(&self, idx: usize) -> Result<PropertyBag, RpcFault> {
        let value = self.values.get(idx).ok_or_else(|| self.bad_arg(idx, "a property map"))?;
        serde_json::from_value(value.clone()).map_err(|_| self.bad_arg(idx, "a property map"))
    }

    fn bags(&self, idx: usize) -> Result<Vec<PropertyBag>, RpcFault> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| self.bad_arg(idx, "a list of property maps"))?;
        serde_json::from_value(value.clone())
            .map_err(|_| self.bad_arg(idx, "a list of property maps"))
    }

    fn bad_arg(&self, idx: usize, expected: &str) -> RpcFault {
        RpcFault::invalid_args(format!(
            "{} argument {idx} must be {expected}",
            self.method
        ))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, RpcFault> {
    serde_json::to_value(value).map_err(|e| RpcFault::invalid_args(e.to_string()))
}

pub fn dispatch(state: &mut MockState, call: &RpcCall, now: UnixTimeSecs) -> Result<Value, RpcFault> {
    let params = Params {
        method: &call.method,
        values: &call.params,
    };
    if call.object == MAIN_OBJECT_PATH {
        return dispatch_main(state, &params);
    }
    let store = state
        .stores
        .store_by_path_mut(&call.object)
        .ok_or_else(|| RpcFault::invalid_args(format!("no such object {}", call.object)))?;
    dispatch_store(store, &params, now)
}

fn dispatch_main(state: &mut MockState, params: &Params<'_>) -> Result<Value, RpcFault> {
    match params.method {
        "AddStore" => {
            params.expect_len(2)?;
            let items = params.bags(1)?;
            state.stores.add_store(params.string(0)?, &items)?;
            Ok(Value::Null)
        }
        "GetStores" => {
            params.expect_len(0)?;
            to_json(&state.stores.store_names())
        }
        "AddItem" => {
            params.expect_len(2)?;
            state.stores.add_item(params.string(0)?, &params.bag(1)?)?;
            Ok(Value::Null)
        }
        "SetItem" => {
            params.expect_len(2)?;
            state.stores.set_item(params.string(0)?, &params.bag(1)?)?;
            Ok(Value::Null)
        }
        other => Err(unknown_method(MAIN_OBJECT_PATH, other)),
    }
}

fn dispatch_store(store: &mut Store, params: &Params<'_>, now: UnixTimeSecs) -> Result<Value, RpcFault> {
    match params.method {
        "StoreAddItem" => {
            params.expect_len(1)?;
            store.add(&params.bag(0)?)?;
            Ok(Value::Null)
        }
        "StoreSetItem" => {
            params.expect_len(2)?;
            store.set_properties(params.string(0)?, &params.bag(1)?)?;
            Ok(Value::Null)
        }
        "GetItem" => {
            params.expect_len(1)?;
            to_json(&store.get(params.string(0)?)?)
        }
        "GetPurchasedItems" => {
            params.expect_len(0)?;
            to_json(&store.list_purchased())
        }
        "PurchaseItem" => {
            params.expect_len(1)?;
            to_json(&store.purchase(params.string(0)?, now)?)
        }
        "RefundItem" => {
            params.expect_len(1)?;
            to_json(&store.refund(params.string(0)?, now)?)
        }
        "AcknowledgeItem" => {
            params.expect_len(1)?;
            to_json(&store.acknowledge(params.string(0)?, now)?)
        }
        other => Err(unknown_method(store.object_path(), other)),
    }
}

fn unknown_method(object: &str, method: &str) -> RpcFault {
    RpcFault::invalid_args(format!("unknown method {method} on {object}"))
}

/// Runs one call against the shared state.
pub fn call_shared(ctx: &AppContext, call: &RpcCall) -> Result<Value, RpcFault> {
    let mut state = lock_state(&ctx.state)?;
    dispatch(&mut state, call, UnixTimeSecs::now())
}

pub async fn rpc_handler(State(ctx): State<AppContext>, body: Bytes) -> Json<RpcReply> {
    let call: RpcCall = match serde_json::from_slice(&body) {
        Ok(call) => call,
        Err(err) => {
            debug!(error = %err, "malformed rpc call");
            return Json(RpcReply::from_outcome(
                Value::Null,
                Err(RpcFault::invalid_args(format!("malformed call: {err}"))),
            ));
        }
    };
    let outcome = call_shared(&ctx, &call);
    match &outcome {
        Ok(_) => debug!(object = %call.object, method = %call.method, "rpc call served"),
        Err(fault) => debug!(object = %call.object, method = %call.method, reason = %fault.message, "rpc call faulted"),
    }
    Json(RpcReply::from_outcome(call.id, outcome))
}
